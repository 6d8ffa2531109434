use tracing::debug;

use crate::log::SegmentLog;

/// A segment whose scheduled play time passed on the session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayoutRecord {
    pub segment: u64,
    pub clock_ms: u64,
}

/// Order in which a track's segments started playing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayoutLog {
    records: Vec<PlayoutRecord>,
}

fn play_start(log: &SegmentLog, segment: u64) -> u64 {
    log.get(segment).map_or(0, |e| e.play_start_ms)
}

impl PlayoutLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[PlayoutRecord] {
        &self.records
    }

    /// Marks as played every segment `n` with
    /// `clock_ms >= play_start(n - 1) + play_start(initial_buffer)`.
    ///
    /// Returns the newly played segment numbers.
    pub fn advance(
        &mut self,
        clock_ms: u64,
        initial_buffer: u64,
        log: &mut SegmentLog,
    ) -> Vec<u64> {
        let startup_ms = play_start(log, initial_buffer);
        let Some(last) = log.last().map(|e| e.segment) else {
            return Vec::new();
        };

        let mut played = Vec::new();
        for segment in 1..=last {
            let due_ms = play_start(log, segment - 1) + startup_ms;
            if clock_ms < due_ms {
                continue;
            }
            let Some(entry) = log.get_mut(segment) else {
                continue;
            };
            if entry.played {
                continue;
            }
            entry.played = true;
            self.records.push(PlayoutRecord { segment, clock_ms });
            played.push(segment);
        }

        if !played.is_empty() {
            debug!(clock_ms, ?played, "segments reached their play time");
        }
        played
    }

    /// Plays out everything left once downloading is over.
    pub fn drain(&mut self, initial_buffer: u64, log: &mut SegmentLog) -> Vec<u64> {
        let clock_ms = log.last().map_or(0, |e| e.play_start_ms) + play_start(log, initial_buffer);
        self.advance(clock_ms, initial_buffer, log)
    }
}
