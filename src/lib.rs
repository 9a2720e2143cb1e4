pub mod bbox;
pub mod classifier;
pub mod codec;
pub mod color;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod history;
pub mod material;
pub mod math;
pub mod piece;
pub mod pipeline;
pub mod segmenter;
pub mod tracker;
pub mod transmitter;

pub use classifier::Classifier;
pub use codec::{PieceRecord, RECORD_LEN};
pub use color::Lab;
pub use config::Config;
pub use detection::Detection;
pub use error::Error;
pub use frame::Frame;
pub use material::Material;
pub use piece::Piece;
pub use pipeline::{spawn_acquisition, FrameSource, Pipeline};
pub use segmenter::Segmenter;
pub use tracker::{SharedTracker, Tracker};
pub use transmitter::{Transmitter, UdpTransmitter};

/// Frame-to-frame association of detections with live pieces.
pub trait Tracking {
    /// Consumes one frame worth of detections (all sharing one timestamp) and
    /// returns the pieces retired by it.
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<Piece>, Error>;

    /// Ids of the pieces currently inside the tracking zone.
    fn live_ids(&self) -> Vec<u64>;
}
