use scrapsort::bbox::BBox;
use scrapsort::config::TrackerConfig;
use scrapsort::{Classifier, Detection, Error, Tracker, Tracking};

fn tracker() -> Tracker {
    let config = TrackerConfig {
        x_min: 0.0,
        x_max: 100.0,
        addition_x: 20.0,
        y_min: 0.0,
        y_max: 100.0,
        min_area: 10,
        max_strikes: 3,
        ..TrackerConfig::default()
    };

    Tracker::new(config, Classifier::default()).unwrap()
}

fn det(x: f64, y: f64, area: u32, ts: f64) -> Detection {
    Detection {
        x,
        y,
        bbox: BBox::ltwh(x as i32, y as i32, 6, 6),
        area,
        color: [184, 115, 51],
        timestamp: ts,
    }
}

/// Sample count and strikes of every live piece.
fn snapshot(t: &Tracker) -> Vec<(usize, u32)> {
    t.pieces()
        .iter()
        .map(|p| (p.positions().len(), p.id().map_or(0, |id| t.strikes(id))))
        .collect()
}

#[test]
fn piece_crosses_the_zone() {
    let mut t = tracker();

    let retired = t.update(&[det(5.0, 50.0, 40, 0.0)]).unwrap();
    assert!(retired.is_empty());
    assert_eq!(t.live_ids(), vec![0]);

    let retired = t.update(&[det(55.0, 50.0, 40, 1.0)]).unwrap();
    assert!(retired.is_empty());
    assert_eq!(t.live_ids(), vec![0]);
    assert_eq!(t.pieces()[0].positions().len(), 2);

    let retired = t.update(&[det(105.0, 50.0, 40, 2.0)]).unwrap();
    assert_eq!(retired.len(), 1);

    let piece = &retired[0];
    assert_eq!(piece.id(), Some(0));
    assert_eq!(piece.positions().len(), 3);

    let v = piece.velocity().unwrap();
    assert!((v.x - 50.0).abs() < 1e-9);
    assert!(v.y.abs() < 1e-9);
    assert!(t.live_ids().is_empty());
}

#[test]
fn empty_updates_change_nothing() {
    let mut t = tracker();
    t.update(&[det(5.0, 20.0, 40, 0.0), det(8.0, 80.0, 40, 0.0)])
        .unwrap();
    t.update(&[det(12.0, 78.0, 40, 1.0)]).unwrap();

    let ids = t.live_ids();
    let before = snapshot(&t);

    for _ in 0..5 {
        assert!(t.update(&[]).unwrap().is_empty());
    }

    assert_eq!(t.live_ids(), ids);
    assert_eq!(snapshot(&t), before);
}

#[test]
fn retired_piece_is_reported_once() {
    let mut t = tracker();
    let mut reported = 0;

    for (i, x) in [2.0, 30.0, 60.0, 90.0, 101.0, 120.0, 140.0].iter().enumerate() {
        reported += t.update(&[det(*x, 50.0, 40, i as f64)]).unwrap().len();
    }

    for i in 7..10 {
        reported += t.update(&[]).unwrap().len();
        reported += t.update(&[det(150.0, 50.0, 40, i as f64)]).unwrap().len();
    }

    assert_eq!(reported, 1);
    assert!(t.live_ids().is_empty());
}

#[test]
fn late_or_small_detections_are_never_admitted() {
    let mut t = tracker();

    for i in 0..5 {
        let ts = i as f64;
        t.update(&[det(25.0 + 5.0 * ts, 50.0, 40, ts), det(5.0, 10.0, 9, ts)])
            .unwrap();
        assert!(t.live_ids().is_empty());
    }
}

#[test]
fn losing_piece_is_evicted_after_too_many_strikes() {
    let mut t = tracker();
    t.update(&[det(5.0, 20.0, 40, 0.0), det(5.0, 80.0, 40, 0.0)])
        .unwrap();

    // Piece 0 keeps nominating the detection piece 1 wins.
    for i in 1..=3 {
        let retired = t.update(&[det(5.0 + i as f64, 80.0, 40, i as f64)]).unwrap();
        assert!(retired.is_empty());
        assert_eq!(t.strikes(0), i);
    }
    assert_eq!(t.live_ids(), vec![0, 1]);

    let retired = t.update(&[det(9.0, 80.0, 40, 4.0)]).unwrap();
    assert!(retired.is_empty());
    assert_eq!(t.live_ids(), vec![1]);
    assert_eq!(t.strikes(0), 0);

    // The evicted piece is gone for good, even past the expulsion boundary.
    let retired = t.update(&[det(120.0, 80.0, 40, 5.0)]).unwrap();
    assert_eq!(retired.len(), 1);
    assert_eq!(retired[0].id(), Some(1));
}

#[test]
fn out_of_order_frame_is_rejected() {
    let mut t = tracker();
    t.update(&[det(5.0, 50.0, 40, 10.0)]).unwrap();

    let err = t.update(&[det(30.0, 50.0, 40, 9.5)]).unwrap_err();
    assert!(matches!(err, Error::NonMonotonicTime { .. }));

    let err = t.update(&[det(30.0, 50.0, 40, f64::NAN)]).unwrap_err();
    assert!(matches!(err, Error::InvalidTimestamp(_)));

    assert_eq!(t.pieces()[0].positions().len(), 1);
}

#[test]
fn older_frame_after_retirement_is_rejected() {
    let mut t = tracker();
    t.update(&[det(5.0, 50.0, 40, 10.0)]).unwrap();

    let retired = t.update(&[det(105.0, 50.0, 40, 11.0)]).unwrap();
    assert_eq!(retired.len(), 1);
    assert!(t.live_ids().is_empty());
    assert_eq!(t.last_timestamp(), Some(11.0));

    let err = t.update(&[det(5.0, 50.0, 40, 3.0)]).unwrap_err();
    match err {
        Error::NonMonotonicTime { last, next } => {
            assert_eq!(last, 11.0);
            assert_eq!(next, 3.0);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(t.live_ids().is_empty());

    t.update(&[det(5.0, 50.0, 40, 11.0)]).unwrap();
    assert_eq!(t.live_ids(), vec![1]);
}

#[test]
fn names_follow_category_and_id() {
    let mut t = tracker();
    t.update(&[det(5.0, 50.0, 40, 0.0)]).unwrap();

    let piece = &t.pieces()[0];
    assert!(piece.category().is_none());
    assert_eq!(piece.name(), Some("unknown-0"));

    t.update(&[det(10.0, 50.0, 40, 1.0)]).unwrap();

    let piece = &t.pieces()[0];
    let material = piece.category().unwrap();
    assert_eq!(piece.name().unwrap(), format!("{}-0", material));
}
