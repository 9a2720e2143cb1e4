use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;
use tracing::debug;

use crate::bbox::{BBox, Ltrb};
use crate::config::SegmenterConfig;
use crate::error::Error;
use crate::{Detection, Frame};

const FOREGROUND: Luma<u8> = Luma([255]);
const BACKGROUND: Luma<u8> = Luma([0]);

type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Running statistics of one connected component.
#[derive(Debug, Clone)]
struct Blob {
    first: (u32, u32),
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u32,
    sum_x: u64,
    sum_y: u64,
    color_sum: [u64; 3],
}

impl Blob {
    fn new(x: u32, y: u32) -> Self {
        Self {
            first: (y, x),
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            area: 0,
            sum_x: 0,
            sum_y: 0,
            color_sum: [0; 3],
        }
    }

    fn add(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.area += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;

        for (sum, c) in self.color_sum.iter_mut().zip(color) {
            *sum += c as u64;
        }
    }

    fn centroid(&self) -> (f64, f64) {
        let n = self.area as f64;
        (self.sum_x as f64 / n, self.sum_y as f64 / n)
    }

    fn bbox(&self) -> BBox<Ltrb> {
        BBox::ltrb(
            self.min_x as i32,
            self.min_y as i32,
            self.max_x as i32 + 1,
            self.max_y as i32 + 1,
        )
    }

    fn detection(&self, timestamp: f64) -> Detection {
        let (x, y) = self.centroid();
        let n = self.area as u64;

        Detection {
            x,
            y,
            bbox: self.bbox().as_ltwh(),
            area: self.area,
            color: self.color_sum.map(|s| (s / n) as u8),
            timestamp,
        }
    }
}

/// Turns a color frame into disjoint foreground detections.
///
/// The frame is blurred, reduced to intensity and binarized either against a
/// fixed threshold or, when a flat field is set, against the absolute
/// difference to that background. Components below `min_area` are noise.
/// Optionally, blobs whose grown boxes touch are bridged with a line between
/// their centroids and relabelled, so fragments of one piece come out as one
/// detection.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
    flat_field: Option<GrayImage>,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            flat_field: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Uses `background` (an empty belt) as the reference for subtraction.
    pub fn set_flat_field(&mut self, background: &RgbImage) {
        let gray = image::imageops::grayscale(&self.denoise(background));
        self.flat_field = Some(gray);
    }

    pub fn clear_flat_field(&mut self) {
        self.flat_field = None;
    }

    #[inline]
    pub fn has_flat_field(&self) -> bool {
        self.flat_field.is_some()
    }

    /// Segments with the configured merge setting.
    pub fn segment(&self, frame: &Frame) -> Result<(GrayImage, Vec<Detection>), Error> {
        self.detect(frame, self.config.merge_detections)
    }

    /// Returns the cleaned binary mask and one detection per surviving blob.
    pub fn detect(
        &self,
        frame: &Frame,
        merge_detections: bool,
    ) -> Result<(GrayImage, Vec<Detection>), Error> {
        let (w, h) = frame.dims();
        if frame.is_empty() {
            return Ok((GrayImage::new(w, h), Vec::new()));
        }

        let gray = image::imageops::grayscale(&self.denoise(&frame.image));
        let binary = self.binarize(&gray)?;
        let mut mask = remove_small_components(&binary, self.config.min_area);

        let mut labels = connected_components(&mask, Connectivity::Eight, BACKGROUND);

        if merge_detections {
            let blobs = collect_blobs(&labels, &frame.image);
            let bridges = bridge_blobs(&mut mask, &blobs, self.config.merge_tolerance as i32);

            if bridges > 0 {
                debug!(bridges, blobs = blobs.len(), "bridged touching blobs");
                labels = connected_components(&mask, Connectivity::Eight, BACKGROUND);
            }
        }

        let blobs = collect_blobs(&labels, &frame.image);
        let mut ordered: Vec<&Blob> = blobs.values().collect();
        ordered.sort_by_key(|b| b.first);

        let detections: Vec<Detection> = ordered
            .into_iter()
            .map(|blob| blob.detection(frame.timestamp))
            .collect();

        debug!(count = detections.len(), ts = frame.timestamp, "segmented frame");

        Ok((mask, detections))
    }

    fn denoise(&self, image: &RgbImage) -> RgbImage {
        if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(image, self.config.blur_sigma)
        } else {
            image.clone()
        }
    }

    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage, Error> {
        match &self.flat_field {
            Some(reference) => {
                if reference.dimensions() != gray.dimensions() {
                    return Err(Error::FlatFieldMismatch {
                        expected: reference.dimensions(),
                        actual: gray.dimensions(),
                    });
                }

                let thresh = self.config.flat_field_threshold;
                Ok(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                    let diff = gray.get_pixel(x, y)[0].abs_diff(reference.get_pixel(x, y)[0]);
                    if diff > thresh {
                        FOREGROUND
                    } else {
                        BACKGROUND
                    }
                }))
            }
            None => {
                let thresh = self.config.threshold;
                Ok(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                    if gray.get_pixel(x, y)[0] > thresh {
                        FOREGROUND
                    } else {
                        BACKGROUND
                    }
                }))
            }
        }
    }
}

/// Clears every component smaller than `min_area` pixels.
fn remove_small_components(mask: &GrayImage, min_area: u32) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, BACKGROUND);

    let mut areas: BTreeMap<u32, u32> = BTreeMap::new();
    for label in labels.pixels() {
        if label[0] != 0 {
            *areas.entry(label[0]).or_insert(0) += 1;
        }
    }

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let label = labels.get_pixel(x, y)[0];
        match areas.get(&label) {
            Some(&area) if label != 0 && area >= min_area => FOREGROUND,
            _ => BACKGROUND,
        }
    })
}

fn collect_blobs(labels: &LabelImage, image: &RgbImage) -> BTreeMap<u32, Blob> {
    let mut blobs: BTreeMap<u32, Blob> = BTreeMap::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }

        blobs
            .entry(label)
            .or_insert_with(|| Blob::new(x, y))
            .add(x, y, image.get_pixel(x, y).0);
    }

    blobs
}

/// Draws a centroid-to-centroid line for every pair of blobs whose boxes,
/// grown by `tolerance`, overlap or touch. Returns the number of lines drawn.
fn bridge_blobs(mask: &mut GrayImage, blobs: &BTreeMap<u32, Blob>, tolerance: i32) -> usize {
    let grown: Vec<(BBox<Ltrb>, (f64, f64))> = blobs
        .values()
        .map(|b| (b.bbox().grow(tolerance), b.centroid()))
        .collect();

    let mut bridges = 0;
    for (i, (a, ca)) in grown.iter().enumerate() {
        for (b, cb) in &grown[i + 1..] {
            if a.touches(b) {
                draw_line_segment_mut(
                    mask,
                    (ca.0 as f32, ca.1 as f32),
                    (cb.0 as f32, cb.1 as f32),
                    FOREGROUND,
                );
                bridges += 1;
            }
        }
    }

    bridges
}
