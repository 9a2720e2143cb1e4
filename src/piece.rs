use nalgebra as na;

use crate::bbox::{BBox, Ltwh};
use crate::classifier::Classifier;
use crate::color::Lab;
use crate::error::{Error, HistoryKind};
use crate::history::History;
use crate::material::Material;
use crate::Detection;

/// A physical piece observed over one or more frames.
///
/// Fresh detections are wrapped as transient pieces (no id, one sample per
/// history); the tracker upgrades the ones it admits and merges later
/// detections into them.
#[derive(Debug, Clone)]
pub struct Piece {
    id: Option<u64>,
    name: Option<String>,
    category: Option<Material>,
    distance: Option<f64>,
    bbox: BBox<Ltwh>,
    colors: History<[u8; 3]>,
    color_sum: [u64; 3],
    positions: History<na::Point2<f64>>,
    areas: History<u32>,
    velocity: Option<na::Vector2<f64>>,
}

impl Piece {
    pub fn new(bbox: BBox<Ltwh>) -> Result<Self, Error> {
        validate_bbox(&bbox)?;

        Ok(Self {
            id: None,
            name: None,
            category: None,
            distance: None,
            bbox,
            colors: History::new(),
            color_sum: [0; 3],
            positions: History::new(),
            areas: History::new(),
            velocity: None,
        })
    }

    pub fn from_detection(det: &Detection) -> Result<Self, Error> {
        let mut piece = Self::new(det.bbox)?;

        piece.add_position_sample(na::Point2::new(det.x, det.y), det.timestamp)?;
        piece.add_color_sample(det.color, det.timestamp)?;
        piece.add_area_sample(det.area, det.timestamp)?;

        Ok(piece)
    }

    /// Assigns the tracker id. Called once, on admission.
    pub fn upgrade(&mut self, id: u64) {
        self.id = Some(id);
        self.rename();
    }

    fn rename(&mut self) {
        self.name = match (self.category, self.id) {
            (Some(m), Some(id)) => Some(format!("{}-{}", m, id)),
            (Some(m), None) => Some(m.to_string()),
            (None, Some(id)) => Some(format!("unknown-{}", id)),
            (None, None) => None,
        };
    }

    pub fn set_bbox(&mut self, bbox: BBox<Ltwh>) -> Result<(), Error> {
        validate_bbox(&bbox)?;
        self.bbox = bbox;
        Ok(())
    }

    pub fn add_color_sample(&mut self, color: [u8; 3], ts: f64) -> Result<(), Error> {
        self.colors.push(ts, color)?;

        for (sum, c) in self.color_sum.iter_mut().zip(color) {
            *sum += c as u64;
        }

        Ok(())
    }

    pub fn add_position_sample(&mut self, pos: na::Point2<f64>, ts: f64) -> Result<(), Error> {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return Err(Error::InvalidPosition { x: pos.x, y: pos.y });
        }

        self.positions.push(ts, pos)
    }

    pub fn add_area_sample(&mut self, area: u32, ts: f64) -> Result<(), Error> {
        self.areas.push(ts, area)
    }

    /// Integer per-channel mean over every color sample.
    pub fn mean_color(&self) -> Result<[u8; 3], Error> {
        let n = self.colors.len() as u64;
        if n == 0 {
            return Err(Error::NoData(HistoryKind::Color));
        }

        Ok(self.color_sum.map(|sum| (sum / n) as u8))
    }

    pub fn mean_area(&self) -> Result<u32, Error> {
        self.areas
            .integer_mean()
            .map(|a| a as u32)
            .ok_or(Error::NoData(HistoryKind::Area))
    }

    pub fn last_area(&self) -> Result<u32, Error> {
        self.areas
            .last()
            .map(|(_, a)| a)
            .ok_or(Error::NoData(HistoryKind::Area))
    }

    pub fn last_position(&self) -> Result<na::Point2<f64>, Error> {
        self.positions
            .last()
            .map(|(_, p)| p)
            .ok_or(Error::NoData(HistoryKind::Position))
    }

    /// Capture time of the most recent position sample.
    pub fn last_seen(&self) -> Result<f64, Error> {
        self.positions
            .last()
            .map(|(ts, _)| ts)
            .ok_or(Error::NoData(HistoryKind::Position))
    }

    /// Displacement between the first and last position sample over the elapsed time.
    pub fn velocity(&self) -> Result<na::Vector2<f64>, Error> {
        let (t0, p0) = self
            .positions
            .first()
            .ok_or(Error::NoData(HistoryKind::Position))?;

        if self.positions.len() < 2 {
            return Err(Error::InsufficientData {
                kind: HistoryKind::Position,
                required: 2,
                available: self.positions.len(),
            });
        }

        let (t1, p1) = self
            .positions
            .last()
            .ok_or(Error::NoData(HistoryKind::Position))?;

        let dt = t1 - t0;
        if dt == 0.0 {
            return Err(Error::DegenerateTime);
        }

        Ok((p1 - p0) / dt)
    }

    #[inline]
    pub fn speed(&self) -> Result<f64, Error> {
        Ok(self.velocity()?.norm())
    }

    /// Labels the piece from its mean color and renames it accordingly.
    pub fn classify(&mut self, classifier: &Classifier) -> Result<(Material, f64), Error> {
        let lab = Lab::from_rgb(self.mean_color()?);
        let (material, distance) = classifier.classify(&lab);

        self.category = Some(material);
        self.distance = Some(distance);
        self.rename();

        Ok((material, distance))
    }

    /// Appends the latest sample of every history of `other`, then refreshes
    /// the velocity estimate and the category.
    ///
    /// Nothing is modified if any sample of `other` would be rejected.
    pub fn merge(&mut self, other: &Piece, classifier: &Classifier) -> Result<(), Error> {
        let (color_ts, color) = other
            .colors
            .last()
            .ok_or(Error::NoData(HistoryKind::Color))?;
        let (pos_ts, pos) = other
            .positions
            .last()
            .ok_or(Error::NoData(HistoryKind::Position))?;
        let (area_ts, area) = other
            .areas
            .last()
            .ok_or(Error::NoData(HistoryKind::Area))?;

        self.colors.accepts(color_ts)?;
        self.positions.accepts(pos_ts)?;
        self.areas.accepts(area_ts)?;

        self.bbox = other.bbox;
        self.add_color_sample(color, color_ts)?;
        self.add_position_sample(pos, pos_ts)?;
        self.add_area_sample(area, area_ts)?;

        self.velocity = self.velocity().ok();
        self.classify(classifier)?;

        Ok(())
    }

    #[inline]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn category(&self) -> Option<Material> {
        self.category
    }

    /// Raw classifier distance of the current category.
    #[inline]
    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    #[inline]
    pub fn bbox(&self) -> &BBox<Ltwh> {
        &self.bbox
    }

    #[inline]
    pub fn colors(&self) -> &History<[u8; 3]> {
        &self.colors
    }

    #[inline]
    pub fn positions(&self) -> &History<na::Point2<f64>> {
        &self.positions
    }

    #[inline]
    pub fn areas(&self) -> &History<u32> {
        &self.areas
    }

    /// Velocity as of the last merge; `None` until two distinct timestamps are seen.
    #[inline]
    pub fn last_velocity(&self) -> Option<na::Vector2<f64>> {
        self.velocity
    }
}

fn validate_bbox(bbox: &BBox<Ltwh>) -> Result<(), Error> {
    if bbox.width() <= 0 || bbox.height() <= 0 {
        return Err(Error::InvalidBBox {
            width: bbox.width().max(0) as u32,
            height: bbox.height().max(0) as u32,
        });
    }

    Ok(())
}
