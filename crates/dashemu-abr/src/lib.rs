//! Rendition selection for the DASH client emulator.
//!
//! Every strategy works on a [`Ladder`] ordered best first and on a
//! per-track [`ThroughputHistory`]. Strategy-specific numbers live in an
//! explicit [`AlgorithmState`] owned by the caller, so several tracks can be
//! adapted independently with one [`AbrController`].
//!
//! ## Example
//!
//! ```rust
//! use dashemu_abr::{
//!     AbrController, AbrOptions, Algorithm, AlgorithmState, DecisionContext, Ladder, SizeTable,
//!     ThroughputHistory,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ladder = Ladder::from_bandwidths(&[500_000, 1_000_000, 2_000_000]).unwrap();
//! let controller = AbrController::new(AbrOptions::default());
//! let mut state = AlgorithmState::new(Algorithm::Conventional);
//! let mut history = ThroughputHistory::new();
//!
//! let ctx = DecisionContext {
//!     sample_bps: 1_500_000,
//!     last_index: ladder.lowest_index(),
//!     ..DecisionContext::default()
//! };
//! let decision = controller
//!     .decide(&mut state, &mut history, &ladder, &ctx, &SizeTable::default())
//!     .await
//!     .unwrap();
//! assert_eq!(decision.target_rendition, 1);
//! # }
//! ```

#![forbid(unsafe_code)]

mod algorithm;
mod controller;
mod error;
mod history;
mod ladder;
mod options;
mod probe;
pub mod stats;
mod strategies;

pub use algorithm::{Algorithm, AlgorithmState};
pub use controller::{AbrController, AbrDecision, AbrReason, DecisionContext};
pub use error::{AbrError, AbrResult};
pub use history::ThroughputHistory;
pub use ladder::{Ladder, Rendition};
pub use options::{AbrOptions, ArbiterOptions};
pub use probe::{SegmentSizeProbe, SizeTable};
