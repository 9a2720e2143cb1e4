use crate::color::Lab;
use crate::error::Error;
use crate::material::Material;

/// Nearest-reference material lookup in Lab space.
///
/// By default only the chrominance channels (a, b) take part in the distance:
/// lightness follows piece height and tilt under the camera, hue does not.
#[derive(Debug, Clone)]
pub struct Classifier {
    references: Vec<(Material, Lab)>,
    use_lightness: bool,
}

impl Classifier {
    pub fn new(references: Vec<(Material, Lab)>) -> Result<Self, Error> {
        if references.is_empty() {
            return Err(Error::EmptyReferenceTable);
        }

        Ok(Self {
            references,
            use_lightness: false,
        })
    }

    pub fn with_lightness(mut self, use_lightness: bool) -> Self {
        self.use_lightness = use_lightness;
        self
    }

    #[inline]
    pub fn references(&self) -> &[(Material, Lab)] {
        &self.references
    }

    #[inline]
    pub fn distance(&self, a: &Lab, b: &Lab) -> f64 {
        if self.use_lightness {
            (a.as_vector() - b.as_vector()).norm()
        } else {
            (a.chroma() - b.chroma()).norm()
        }
    }

    /// Closest material and its raw distance. Ties go to the earlier table entry.
    pub fn classify(&self, color: &Lab) -> (Material, f64) {
        let mut best = (self.references[0].0, self.distance(color, &self.references[0].1));

        for (material, reference) in &self.references[1..] {
            let dist = self.distance(color, reference);
            if dist < best.1 {
                best = (*material, dist);
            }
        }

        best
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            references: Material::ALL.iter().map(|m| (*m, m.reference())).collect(),
            use_lightness: false,
        }
    }
}
