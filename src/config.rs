use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::classifier::Classifier;
use crate::color::Lab;
use crate::error::Error;
use crate::material::Material;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Intensity above which a pixel is foreground (no flat field).
    pub threshold: u8,
    /// Absolute difference to the flat field above which a pixel is foreground.
    pub flat_field_threshold: u8,
    /// Components smaller than this many pixels are noise.
    pub min_area: u32,
    /// Margin in pixels each box grows by before testing blobs for merging.
    pub merge_tolerance: u32,
    /// Gaussian blur sigma; 0 disables denoising.
    pub blur_sigma: f32,
    pub merge_detections: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            threshold: 85,
            flat_field_threshold: 20,
            min_area: 135,
            merge_tolerance: 10,
            blur_sigma: 5.0,
            merge_detections: true,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "blur_sigma must be >= 0, got {}",
                self.blur_sigma
            )));
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub x_min: f64,
    /// Expulsion boundary: pieces at or beyond it are retired.
    pub x_max: f64,
    /// Admission boundary: new pieces must start at or before it.
    pub addition_x: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub min_area: u32,
    pub max_strikes: u32,
    pub weight_x: f64,
    pub weight_y: f64,
    pub weight_area: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 450.0,
            addition_x: 100.0,
            y_min: 0.0,
            y_max: 640.0,
            min_area: 135,
            max_strikes: 3,
            weight_x: 0.3,
            weight_y: 0.5,
            weight_area: 0.2,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let bounds = [self.x_min, self.x_max, self.addition_x, self.y_min, self.y_max];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig("tracker bounds must be finite".into()));
        }

        if self.addition_x > self.x_max {
            return Err(Error::InvalidBounds {
                addition: self.addition_x,
                expulsion: self.x_max,
            });
        }

        if self.x_min >= self.x_max || self.y_min >= self.y_max {
            return Err(Error::InvalidConfig(format!(
                "empty tracking zone: x {}..{}, y {}..{}",
                self.x_min, self.x_max, self.y_min, self.y_max
            )));
        }

        let weights = [self.weight_x, self.weight_y, self.weight_area];
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "match weights must be positive, got {:?}",
                weights
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn x_range(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn y_range(&self) -> f64 {
        self.y_max - self.y_min
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub use_lightness: bool,
    /// Reference colors as `[L, a, b]` in the 8-bit Lab scale.
    pub references: BTreeMap<Material, [f64; 3]>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let references = Material::ALL
            .iter()
            .map(|m| {
                let lab = m.reference();
                (*m, [lab.l, lab.a, lab.b])
            })
            .collect();

        Self {
            use_lightness: false,
            references,
        }
    }
}

impl ClassifierConfig {
    pub fn build(&self) -> Result<Classifier, Error> {
        let references = self
            .references
            .iter()
            .map(|(m, [l, a, b])| (*m, Lab::new(*l, *a, *b)))
            .collect();

        Ok(Classifier::new(references)?.with_lightness(self.use_lightness))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Physical distance covered by one pixel of travel.
    pub distance_per_pixel: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            distance_per_pixel: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TransmitterConfig {
    pub group: Ipv4Addr,
    pub port: u16,
    pub ttl: u32,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(239, 0, 0, 1),
            port: 5001,
            ttl: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub segmenter: SegmenterConfig,
    pub tracker: TrackerConfig,
    pub classifier: ClassifierConfig,
    pub calibration: CalibrationConfig,
    pub transmitter: TransmitterConfig,
}

impl Config {
    pub fn from_toml_str(src: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let src = std::fs::read_to_string(path)?;

        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.segmenter.validate()?;
        self.tracker.validate()?;

        if self.classifier.references.is_empty() {
            return Err(Error::EmptyReferenceTable);
        }

        let k = self.calibration.distance_per_pixel;
        if !k.is_finite() || k <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "distance_per_pixel must be positive, got {}",
                k
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.classifier.references.len(), Material::ALL.len());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [segmenter]
            threshold = 80
            min_area = 300

            [tracker]
            x_max = 600.0
            addition_x = 50.0

            [classifier.references]
            copper = [120.0, 137.0, 145.0]
            zinc = [135.0, 140.0, 142.0]

            [transmitter]
            group = "239.1.2.3"
            "#,
        )
        .unwrap();

        assert_eq!(config.segmenter.threshold, 80);
        assert_eq!(config.segmenter.min_area, 300);
        assert_eq!(config.segmenter.flat_field_threshold, 20);
        assert_eq!(config.tracker.x_max, 600.0);
        assert_eq!(config.tracker.max_strikes, 3);
        assert_eq!(config.classifier.references.len(), 2);
        assert_eq!(config.transmitter.group, Ipv4Addr::new(239, 1, 2, 3));
        assert_eq!(config.transmitter.port, 5001);

        let classifier = config.classifier.build().unwrap();
        assert_eq!(classifier.references().len(), 2);
    }

    #[test]
    fn addition_beyond_expulsion_is_fatal() {
        let err = Config::from_toml_str(
            r#"
            [tracker]
            x_max = 100.0
            addition_x = 150.0
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidBounds { .. }));
    }

    #[test]
    fn empty_reference_table_is_fatal() {
        let mut config = Config::default();
        config.classifier.references.clear();

        assert!(matches!(config.validate(), Err(Error::EmptyReferenceTable)));
        assert!(matches!(config.classifier.build(), Err(Error::EmptyReferenceTable)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[tracker\nx_max = "),
            Err(Error::ConfigParse(_))
        ));
    }
}
