use std::time::Duration;

use dashemu_abr::{Algorithm, AlgorithmState, ThroughputHistory};
use tokio::time::Instant;

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Mutable bookkeeping of one track, owned by the session loop.
#[derive(Clone, Debug)]
pub struct StreamState {
    /// Next segment to download, 1-based.
    pub segment_number: u64,
    /// Rendition of the next download.
    pub rendition: usize,
    /// Simulated media waiting to be played.
    pub buffer_ms: u64,
    /// Media duration downloaded so far.
    pub played_ms: u64,
    pub stall_total_ms: u64,
    /// Segments absorbed so far; playback starts once it reaches the
    /// initial buffer size.
    pub wait_to_play: u64,
    pub manifest_index: usize,
    pub algorithm: AlgorithmState,
    pub history: ThroughputHistory,
    pub finished: bool,
    pub(crate) last_run: Instant,
}

impl StreamState {
    #[must_use]
    pub fn new(algorithm: Algorithm, rendition: usize, manifest_index: usize) -> Self {
        Self {
            segment_number: 1,
            rendition,
            buffer_ms: 0,
            played_ms: 0,
            stall_total_ms: 0,
            wait_to_play: 0,
            manifest_index,
            algorithm: AlgorithmState::new(algorithm),
            history: ThroughputHistory::new(),
            finished: false,
            last_run: Instant::now(),
        }
    }

    /// Whether initial buffering is over.
    #[must_use]
    pub fn is_playing(&self, initial_buffer: u64) -> bool {
        initial_buffer <= self.wait_to_play
    }

    /// Adds a downloaded segment to the buffer and returns the stall it caused.
    ///
    /// During initial buffering the segment only accumulates. Afterwards the
    /// buffer first drains by `elapsed_ms`; a shortfall is the stall and the
    /// buffer bottoms out at zero.
    pub fn absorb_segment(&mut self, elapsed_ms: u64, segment_ms: u64, initial_buffer: u64) -> u64 {
        let stall_ms = if self.is_playing(initial_buffer) {
            let stall = elapsed_ms.saturating_sub(self.buffer_ms);
            self.buffer_ms = self.buffer_ms.saturating_sub(elapsed_ms) + segment_ms;
            stall
        } else {
            self.buffer_ms += segment_ms;
            0
        };
        self.wait_to_play += 1;
        self.stall_total_ms += stall_ms;
        stall_ms
    }

    /// Trims the buffer to `max_buffer_ms`, returning how long to pause.
    pub fn take_backpressure(&mut self, max_buffer_ms: u64) -> Option<u64> {
        let excess = self.buffer_ms.checked_sub(max_buffer_ms).filter(|e| *e > 0)?;
        self.buffer_ms = max_buffer_ms;
        Some(excess)
    }

    /// Milliseconds since the previous step, restarting the measurement.
    pub(crate) fn lap(&mut self) -> u64 {
        let now = Instant::now();
        let elapsed = millis(now.duration_since(self.last_run));
        self.last_run = now;
        elapsed
    }
}
