use image::RgbImage;

pub struct Frame {
    pub image: RgbImage,
    pub timestamp: f64, // in seconds since epoch
}

impl Frame {
    #[inline]
    pub fn new(image: RgbImage, timestamp: f64) -> Self {
        Self { image, timestamp }
    }

    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}
