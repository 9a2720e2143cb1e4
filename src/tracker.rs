use nalgebra as na;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::classifier::Classifier;
use crate::config::TrackerConfig;
use crate::error::Error;
use crate::math;
use crate::piece::Piece;
use crate::{Detection, Tracking};

/// Follows pieces along the conveyor between the admission and expulsion
/// boundaries (x is the direction of travel).
///
/// Matching is greedy: every live piece nominates its best scoring detection,
/// nominations are resolved by descending score and the first claim on a
/// detection wins. A live piece that loses its claim takes a strike; one that
/// accumulates more than `max_strikes` consecutive strikes is dropped without
/// being reported.
///
/// Admitted pieces start as `unknown-<id>` and get a category from their mean
/// color on every later match, or at retirement if they were never matched.
///
/// Ids count up from 0 and are unique within one tracker; a sorting line runs
/// a single tracker per process.
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    classifier: Classifier,
    pieces: Vec<Piece>,
    strikes: HashMap<u64, u32>,
    next_id: u64,
    last_ts: f64,
}

impl Tracker {
    pub fn new(config: TrackerConfig, classifier: Classifier) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            classifier,
            pieces: Vec::with_capacity(32),
            strikes: HashMap::new(),
            next_id: 0,
            last_ts: f64::NEG_INFINITY,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Consecutive lost claims of a live piece.
    #[inline]
    pub fn strikes(&self, id: u64) -> u32 {
        self.strikes.get(&id).copied().unwrap_or(0)
    }

    #[inline]
    fn weights(&self) -> na::Vector3<f64> {
        na::Vector3::new(
            self.config.weight_x,
            self.config.weight_y,
            self.config.weight_area,
        )
    }

    /// Similarity of a fresh detection to a live piece, 1.0 being identical.
    pub fn score(&self, tracked: &Piece, fresh: &Piece) -> Result<f64, Error> {
        let a = tracked.last_position()?;
        let b = fresh.last_position()?;
        let da = fresh.last_area()? as f64 - tracked.last_area()? as f64;

        let xr = self.config.x_range();
        let yr = self.config.y_range();
        let deltas = na::Vector3::new((b.x - a.x) / xr, (b.y - a.y) / yr, da / (xr * yr));

        Ok(math::similarity(deltas, self.weights()))
    }

    /// Best fresh candidate per live piece as `(live, fresh, score)`, sorted by
    /// descending score. Two live pieces may nominate the same candidate.
    fn assignment(&self, fresh: &[Piece]) -> Result<Vec<(usize, usize, f64)>, Error> {
        let mut proposals = Vec::with_capacity(self.pieces.len());

        if fresh.is_empty() {
            return Ok(proposals);
        }

        for (i, tracked) in self.pieces.iter().enumerate() {
            let mut best: Option<(usize, f64)> = None;

            for (j, candidate) in fresh.iter().enumerate() {
                let score = self.score(tracked, candidate)?;
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((j, score));
                }
            }

            if let Some((j, score)) = best {
                proposals.push((i, j, score));
            }
        }

        proposals.sort_by(|a, b| b.2.total_cmp(&a.2));

        Ok(proposals)
    }

    /// Newest frame time accepted so far, including frames whose pieces have
    /// all been retired or evicted since.
    #[inline]
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_ts.is_finite().then_some(self.last_ts)
    }

    fn check_order(&self, detections: &[Detection]) -> Result<f64, Error> {
        let mut newest = self.last_ts;

        for det in detections {
            if !det.timestamp.is_finite() || det.timestamp < 0.0 {
                return Err(Error::InvalidTimestamp(det.timestamp));
            }

            if det.timestamp < self.last_ts {
                return Err(Error::NonMonotonicTime {
                    last: self.last_ts,
                    next: det.timestamp,
                });
            }

            newest = newest.max(det.timestamp);
        }

        Ok(newest)
    }

    /// Feeds one frame worth of detections and returns the pieces that crossed
    /// the expulsion boundary during this call. Each piece is returned at most
    /// once over the lifetime of the tracker.
    ///
    /// Frames must arrive in temporal order; validation happens before any
    /// state is touched.
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<Piece>, Error> {
        let newest = self.check_order(detections)?;

        let fresh = detections
            .iter()
            .map(Piece::from_detection)
            .collect::<Result<Vec<_>, _>>()?;

        let proposals = self.assignment(&fresh)?;

        let mut claimed = vec![false; fresh.len()];
        let mut evicted = HashSet::new();

        for (i, j, score) in proposals {
            let Some(id) = self.pieces[i].id() else {
                continue;
            };

            if claimed[j] {
                let strikes = self.strikes.entry(id).or_insert(0);
                *strikes += 1;
                debug!(id, strikes = *strikes, score, "lost claim on detection");

                if *strikes > self.config.max_strikes {
                    evicted.insert(id);
                }
            } else {
                claimed[j] = true;
                trace!(id, detection = j, score, "matched");

                self.pieces[i].merge(&fresh[j], &self.classifier)?;
                self.strikes.remove(&id);
            }
        }

        if !evicted.is_empty() {
            self.pieces
                .retain(|p| p.id().map_or(true, |id| !evicted.contains(&id)));

            for id in &evicted {
                self.strikes.remove(id);
                debug!(id, "evicted after too many strikes");
            }
        }

        for (j, mut piece) in fresh.into_iter().enumerate() {
            if claimed[j] {
                continue;
            }

            let area = piece.last_area()?;
            let x = piece.last_position()?.x;

            if area < self.config.min_area || x > self.config.addition_x {
                debug!(x, area, "detection not admitted");
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;

            piece.upgrade(id);
            debug!(id, x, area, "admitted");

            self.pieces.push(piece);
        }

        let x_max = self.config.x_max;
        let (mut retired, live): (Vec<Piece>, Vec<Piece>) = std::mem::take(&mut self.pieces)
            .into_iter()
            .partition(|p| p.last_position().map_or(false, |pos| pos.x >= x_max));

        self.pieces = live;
        self.last_ts = newest;

        for piece in &mut retired {
            if piece.category().is_none() {
                piece.classify(&self.classifier)?;
            }

            if let Some(id) = piece.id() {
                self.strikes.remove(&id);
            }

            debug!(
                id = ?piece.id(),
                category = ?piece.category(),
                samples = piece.positions().len(),
                "retired"
            );
        }

        Ok(retired)
    }
}

impl Tracking for Tracker {
    #[inline]
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<Piece>, Error> {
        Tracker::update(self, detections)
    }

    #[inline]
    fn live_ids(&self) -> Vec<u64> {
        self.pieces.iter().filter_map(Piece::id).collect()
    }
}

/// Tracker shared between threads. The lock is held for a whole `update`.
#[derive(Debug, Clone)]
pub struct SharedTracker(Arc<Mutex<Tracker>>);

impl SharedTracker {
    pub fn new(tracker: Tracker) -> Self {
        Self(Arc::new(Mutex::new(tracker)))
    }

    pub fn update(&self, detections: &[Detection]) -> Result<Vec<Piece>, Error> {
        self.0.lock().update(detections)
    }

    /// Runs `f` against a consistent snapshot of the tracker.
    pub fn with<R>(&self, f: impl FnOnce(&Tracker) -> R) -> R {
        f(&self.0.lock())
    }
}

impl Tracking for SharedTracker {
    #[inline]
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<Piece>, Error> {
        SharedTracker::update(self, detections)
    }

    #[inline]
    fn live_ids(&self) -> Vec<u64> {
        self.with(|t| t.live_ids())
    }
}
