use dashemu_abr::AbrError;
use dashemu_net::NetError;
use thiserror::Error;

/// Playback loop errors. Every variant ends the session.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("network error: {0}")]
    Net(#[from] NetError),

    #[error("rate selection error: {0}")]
    Abr(#[from] AbrError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("codec {0} is not offered by the manifest")]
    CodecNotFound(String),

    #[error("segment {segment} of rendition {rendition} is not described by track {track}")]
    SegmentOutOfRange {
        track: usize,
        rendition: usize,
        segment: u64,
    },

    #[error("invalid segment URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

pub type PlayerResult<T> = Result<T, PlayerError>;
