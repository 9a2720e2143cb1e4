use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::material::Material;
use crate::piece::Piece;

/// Size of an encoded record: `material: u32 | timestamp_ms: u64 | speed: f32`,
/// all big-endian.
pub const RECORD_LEN: usize = 16;

/// What the actuator needs to know about a retired piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceRecord {
    pub material: Material,
    /// Capture time of the last position sample, milliseconds since epoch.
    pub timestamp_ms: u64,
    /// Physical speed; `None` if the piece was seen at a single instant.
    pub speed: Option<f32>,
}

impl PieceRecord {
    /// Builds the record of a classified piece, scaling pixel speed by
    /// `distance_per_pixel`.
    pub fn from_piece(piece: &Piece, distance_per_pixel: f64) -> Result<Self, Error> {
        let material = piece.category().ok_or(Error::Unclassified)?;
        // Histories only hold finite, non-negative timestamps.
        let last_seen = piece.last_seen()?;

        let speed = match piece.speed() {
            Ok(speed) => Some((speed * distance_per_pixel) as f32),
            Err(Error::InsufficientData { .. }) | Err(Error::DegenerateTime) => None,
            Err(err) => return Err(err),
        };

        Ok(Self {
            material,
            timestamp_ms: (last_seen * 1000.0).round() as u64,
            speed,
        })
    }

    /// Missing speed goes on the wire as NaN.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RECORD_LEN);
        buf.put_u32(self.material.ordinal());
        buf.put_u64(self.timestamp_ms);
        buf.put_f32(self.speed.unwrap_or(f32::NAN));
        buf.freeze()
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < RECORD_LEN {
            return Err(Error::TruncatedRecord(buf.len()));
        }

        let material = Material::from_ordinal(buf.get_u32())?;
        let timestamp_ms = buf.get_u64();
        let speed = buf.get_f32();

        Ok(Self {
            material,
            timestamp_ms,
            speed: if speed.is_nan() { None } else { Some(speed) },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::classifier::Classifier;
    use nalgebra as na;

    fn piece(positions: &[(f64, f64)]) -> Piece {
        let mut p = Piece::new(BBox::ltwh(0, 0, 4, 4)).unwrap();
        for &(x, ts) in positions {
            p.add_position_sample(na::Point2::new(x, 0.0), ts).unwrap();
        }
        p.add_color_sample([136, 105, 83], 0.0).unwrap();
        p
    }

    #[test]
    fn layout_is_big_endian() {
        let record = PieceRecord {
            material: Material::Brass,
            timestamp_ms: 0x0102_0304_0506_0708,
            speed: Some(1.0),
        };

        let bytes = record.encode();
        assert_eq!(bytes.len(), RECORD_LEN);
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..12], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[12..], &1.0f32.to_be_bytes());
        assert_eq!(PieceRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn speed_is_scaled_and_timestamped_from_last_position() {
        let classifier = Classifier::default();
        let mut p = piece(&[(0.0, 100.0), (30.0, 100.5), (60.0, 101.0)]);
        let (material, _) = p.classify(&classifier).unwrap();

        let record = PieceRecord::from_piece(&p, 0.5).unwrap();
        assert_eq!(record.material, material);
        assert_eq!(record.timestamp_ms, 101_000);
        assert_eq!(record.speed, Some(30.0));
    }

    #[test]
    fn single_sample_has_no_speed() {
        let classifier = Classifier::default();
        let mut p = piece(&[(10.0, 2.0)]);
        p.classify(&classifier).unwrap();

        let record = PieceRecord::from_piece(&p, 1.0).unwrap();
        assert_eq!(record.speed, None);

        let decoded = PieceRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded.speed, None);
    }

    #[test]
    fn negative_timestamp_never_reaches_the_wire() {
        let mut p = Piece::new(BBox::ltwh(0, 0, 4, 4)).unwrap();

        assert!(matches!(
            p.add_position_sample(na::Point2::new(1.0, 0.0), -2.0),
            Err(Error::InvalidTimestamp(_))
        ));
        assert!(matches!(PieceRecord::from_piece(&p, 1.0), Err(Error::Unclassified)));
    }

    #[test]
    fn unclassified_piece_is_an_error() {
        let p = piece(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(PieceRecord::from_piece(&p, 1.0), Err(Error::Unclassified)));
    }

    #[test]
    fn rejects_short_and_unknown_records() {
        assert!(matches!(
            PieceRecord::decode(&[0; 15]),
            Err(Error::TruncatedRecord(15))
        ));

        let mut raw = [0u8; RECORD_LEN];
        raw[3] = 9;
        assert!(matches!(PieceRecord::decode(&raw), Err(Error::UnknownMaterial(9))));
    }
}
