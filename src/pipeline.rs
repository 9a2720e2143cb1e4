use crossbeam::channel::{self, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::codec::PieceRecord;
use crate::config::Config;
use crate::error::Error;
use crate::segmenter::Segmenter;
use crate::tracker::Tracker;
use crate::transmitter::Transmitter;
use crate::{Frame, Tracking};

/// Per-frame perception: segment, track, encode whatever left the zone.
#[derive(Debug)]
pub struct Pipeline<T: Tracking = Tracker> {
    segmenter: Segmenter,
    tracker: T,
    distance_per_pixel: f64,
}

impl Pipeline<Tracker> {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        config.validate()?;

        let segmenter = Segmenter::new(config.segmenter.clone())?;
        let classifier = config.classifier.build()?;
        let tracker = Tracker::new(config.tracker.clone(), classifier)?;

        Ok(Self::new(
            segmenter,
            tracker,
            config.calibration.distance_per_pixel,
        ))
    }
}

impl<T: Tracking> Pipeline<T> {
    pub fn new(segmenter: Segmenter, tracker: T, distance_per_pixel: f64) -> Self {
        Self {
            segmenter,
            tracker,
            distance_per_pixel,
        }
    }

    #[inline]
    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    #[inline]
    pub fn segmenter_mut(&mut self) -> &mut Segmenter {
        &mut self.segmenter
    }

    #[inline]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Records of the pieces retired by this frame.
    pub fn process(&mut self, frame: &Frame) -> Result<Vec<PieceRecord>, Error> {
        let (_, detections) = self.segmenter.segment(frame)?;
        let retired = self.tracker.update(&detections)?;

        retired
            .iter()
            .map(|piece| PieceRecord::from_piece(piece, self.distance_per_pixel))
            .collect()
    }

    /// Drains `frames` in arrival order, handing every record to `out`.
    ///
    /// Returns the number of records delivered once the channel closes. A
    /// failed send loses that record only; processing errors stop the loop.
    pub fn run<O: Transmitter>(
        &mut self,
        frames: &Receiver<Frame>,
        out: &mut O,
    ) -> Result<usize, Error> {
        let mut delivered = 0;

        for frame in frames.iter() {
            for record in self.process(&frame)? {
                match out.send(&record) {
                    Ok(()) => delivered += 1,
                    Err(err) => warn!(error = %err, "dropping record"),
                }
            }
        }

        debug!(delivered, "frame channel closed");

        Ok(delivered)
    }
}

/// Anything that yields frames in capture order. `Ok(None)` ends the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Error>;
}

impl FrameSource for std::vec::IntoIter<Frame> {
    #[inline]
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        Ok(self.next())
    }
}

/// Runs `source` on its own thread, feeding a channel of at most `capacity`
/// frames. The producer blocks while the channel is full and stops when the
/// source ends, fails or the receiver is dropped.
pub fn spawn_acquisition<S>(
    mut source: S,
    capacity: usize,
) -> (Receiver<Frame>, JoinHandle<Result<(), Error>>)
where
    S: FrameSource + Send + 'static,
{
    let (tx, rx) = channel::bounded(capacity.max(1));

    let handle = thread::spawn(move || {
        let mut count = 0u64;

        while let Some(frame) = source.next_frame()? {
            if tx.send(frame).is_err() {
                debug!(count, "frame consumer gone");
                return Ok(());
            }

            count += 1;
        }

        debug!(count, "frame source exhausted");

        Ok(())
    });

    (rx, handle)
}
