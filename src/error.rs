use thiserror::Error;

/// Which per-piece time series an accessor needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Color,
    Position,
    Area,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HistoryKind::Color => "color",
            HistoryKind::Position => "position",
            HistoryKind::Area => "area",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid position: ({x}, {y})")]
    InvalidPosition { x: f64, y: f64 },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    #[error("Timestamp {next} is older than the last sample at {last}")]
    NonMonotonicTime { last: f64, next: f64 },

    #[error("Invalid bounding box: {width}x{height}")]
    InvalidBBox { width: u32, height: u32 },

    #[error("No {0} samples available")]
    NoData(HistoryKind),

    #[error("Need at least {required} {kind} samples, have {available}")]
    InsufficientData {
        kind: HistoryKind,
        required: usize,
        available: usize,
    },

    #[error("Elapsed time between first and last position sample is zero")]
    DegenerateTime,

    #[error("Piece has no material category")]
    Unclassified,

    #[error("Classifier reference table is empty")]
    EmptyReferenceTable,

    #[error("Addition boundary {addition} is beyond expulsion boundary {expulsion}")]
    InvalidBounds { addition: f64, expulsion: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Flat field is {expected:?} but frame is {actual:?}")]
    FlatFieldMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Truncated record: {0} bytes")]
    TruncatedRecord(usize),

    #[error("Unknown material ordinal: {0}")]
    UnknownMaterial(u32),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}
