use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};

/// One connected foreground region of a single frame.
///
/// Contains the centroid (x,y), the pixel bounding box, the pixel count and
/// the mean color of the region sampled from the unblurred frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub bbox: BBox<Ltwh>,
    pub area: u32,
    #[serde(rename = "c")]
    pub color: [u8; 3],
    #[serde(rename = "ts")]
    pub timestamp: f64,
}

impl Detection {
    #[inline(always)]
    pub fn centroid(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltwh> {
        self.bbox
    }

    #[inline(always)]
    pub fn xmin(&self) -> i32 {
        self.bbox.left()
    }

    #[inline(always)]
    pub fn xmax(&self) -> i32 {
        self.bbox.left() + self.bbox.width()
    }

    #[inline(always)]
    pub fn ymin(&self) -> i32 {
        self.bbox.top()
    }

    #[inline(always)]
    pub fn ymax(&self) -> i32 {
        self.bbox.top() + self.bbox.height()
    }
}
