use thiserror::Error;

/// Errors raised while building a ladder or selecting a rendition.
#[derive(Debug, Error)]
pub enum AbrError {
    #[error("ladder has no renditions")]
    EmptyLadder,

    #[error(
        "ladder is not strictly monotonic at rendition {index}: {previous} bps followed by {current} bps"
    )]
    NonMonotonicLadder {
        index: usize,
        previous: u64,
        current: u64,
    },

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("rendition {index} out of range for a ladder of {len}")]
    RenditionOutOfRange { index: usize, len: usize },

    #[error("no size known for segment {segment} of rendition {rendition}")]
    MissingSegmentSize { rendition: usize, segment: u64 },

    #[error("segment size probe failed: {0}")]
    Probe(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AbrError {
    /// Wraps a collaborator error raised while probing segment sizes.
    pub fn probe<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Probe(Box::new(error))
    }
}

pub type AbrResult<T> = Result<T, AbrError>;
