//! Playback loop of the DASH client emulator.
//!
//! A [`Session`] walks the tracks of one or more [`Manifest`]s segment by
//! segment. Downloads go through a [`SegmentFetcher`]; the simulated buffer,
//! stall accounting, backpressure and segment replacement live in the loop,
//! and the next rendition comes from [`dashemu_abr`].

#![forbid(unsafe_code)]

mod config;
mod error;
mod fetch;
mod log;
mod manifest;
mod peer;
mod playout;
mod replacement;
mod selector;
mod session;
mod state;

pub use config::{PlayerConfig, ReplacementRule};
pub use error::{PlayerError, PlayerResult};
pub use fetch::{FetchedSegment, HttpSegmentFetcher, SegmentFetcher, SegmentRequest};
pub use log::{QoeCounters, SegmentLog, SegmentLogEntry};
pub use manifest::{Manifest, SegmentSource, TrackKind, TrackManifest, codec_family};
pub use peer::{NoPeers, PeerResolver, PeerTable};
pub use playout::{PlayoutLog, PlayoutRecord};
pub use selector::{ManifestSelector, NextSegment};
pub use session::{Phase, Session, SessionReport, TrackReport};
pub use state::StreamState;
