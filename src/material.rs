use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::color::Lab;
use crate::error::Error;

/// Sortable materials. The ordinal is part of the wire contract.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Copper,
    Zinc,
    Brass,
    Pcb,
}

impl Material {
    pub const ALL: [Material; 4] = [
        Material::Copper,
        Material::Zinc,
        Material::Brass,
        Material::Pcb,
    ];

    #[inline]
    pub fn ordinal(self) -> u32 {
        match self {
            Material::Copper => 0,
            Material::Zinc => 1,
            Material::Brass => 2,
            Material::Pcb => 3,
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Result<Self, Error> {
        match ordinal {
            0 => Ok(Material::Copper),
            1 => Ok(Material::Zinc),
            2 => Ok(Material::Brass),
            3 => Ok(Material::Pcb),
            other => Err(Error::UnknownMaterial(other)),
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Material::Copper => "copper",
            Material::Zinc => "zinc",
            Material::Brass => "brass",
            Material::Pcb => "pcb",
        }
    }

    /// Reference color in the 8-bit Lab scale (L, a, b all in 0..=255).
    pub fn reference(self) -> Lab {
        match self {
            Material::Copper => Lab::new(120.0, 137.0, 145.0),
            Material::Zinc => Lab::new(135.0, 140.0, 142.0),
            Material::Brass => Lab::new(133.0, 128.0, 154.0),
            Material::Pcb => Lab::new(101.0, 123.0, 117.0),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_dense_and_reversible() {
        for (i, m) in Material::ALL.iter().enumerate() {
            assert_eq!(m.ordinal(), i as u32);
            assert_eq!(Material::from_ordinal(i as u32).unwrap(), *m);
        }

        assert!(matches!(Material::from_ordinal(4), Err(Error::UnknownMaterial(4))));
    }
}
