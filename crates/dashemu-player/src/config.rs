use std::fmt;

use dashemu_abr::{AbrOptions, Algorithm};

use crate::{PlayerError, PlayerResult};

/// When to re-fetch an earlier segment of a video track.
///
/// When the loop reaches segment `at_segment`, segment `replace_segment` is
/// downloaded again at the current rendition and the buffer history between
/// the two is rewritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplacementRule {
    pub at_segment: u64,
    pub replace_segment: u64,
}

impl Default for ReplacementRule {
    fn default() -> Self {
        Self {
            at_segment: 6,
            replace_segment: 5,
        }
    }
}

/// Configuration of one emulated playback session.
#[derive(Clone)]
pub struct PlayerConfig {
    /// Rate selection strategy applied to every track.
    pub algorithm: Algorithm,
    /// Strategy tuning.
    pub abr: AbrOptions,
    /// Segments downloaded before playback starts.
    pub initial_buffer_segments: u64,
    /// Buffer level above which downloading pauses, in seconds.
    pub max_buffer_secs: u64,
    /// Highest allowed rendition height; `None` allows every rendition.
    pub max_height: Option<u32>,
    /// Stop after this much media instead of the manifest duration.
    pub stream_duration_ms: Option<u64>,
    /// Video codec to stream (`h264`, `h265`, `vp9`, `av1`, or a codec
    /// string prefix); `None` keeps every track.
    pub codec: Option<String>,
    /// Segment replacement; `None` disables it.
    pub replacement: Option<ReplacementRule>,
    /// Record playback position in the segment log.
    pub extended_log: bool,
    /// Seed for picking among compatible manifests.
    pub rng_seed: Option<u64>,
    /// Capacity of the events broadcast channel.
    pub events_channel_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Conventional,
            abr: AbrOptions::default(),
            initial_buffer_segments: 2,
            max_buffer_secs: 60,
            max_height: None,
            stream_duration_ms: None,
            codec: None,
            replacement: None,
            extended_log: false,
            rng_seed: None,
            events_channel_capacity: 256,
        }
    }
}

impl fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("algorithm", &self.algorithm.name())
            .field("initial_buffer_segments", &self.initial_buffer_segments)
            .field("max_buffer_secs", &self.max_buffer_secs)
            .field("max_height", &self.max_height)
            .field("stream_duration_ms", &self.stream_duration_ms)
            .field("codec", &self.codec)
            .field("replacement", &self.replacement)
            .field("extended_log", &self.extended_log)
            .finish_non_exhaustive()
    }
}

impl PlayerConfig {
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_abr(mut self, abr: AbrOptions) -> Self {
        self.abr = abr;
        self
    }

    #[must_use]
    pub fn with_initial_buffer(mut self, segments: u64) -> Self {
        self.initial_buffer_segments = segments;
        self
    }

    #[must_use]
    pub fn with_max_buffer_secs(mut self, secs: u64) -> Self {
        self.max_buffer_secs = secs;
        self
    }

    #[must_use]
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    #[must_use]
    pub fn with_stream_duration_ms(mut self, duration_ms: u64) -> Self {
        self.stream_duration_ms = Some(duration_ms);
        self
    }

    #[must_use]
    pub fn with_codec<S: Into<String>>(mut self, codec: S) -> Self {
        self.codec = Some(codec.into());
        self
    }

    #[must_use]
    pub fn with_replacement(mut self, rule: ReplacementRule) -> Self {
        self.replacement = Some(rule);
        self
    }

    #[must_use]
    pub fn with_extended_log(mut self, enabled: bool) -> Self {
        self.extended_log = enabled;
        self
    }

    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn max_buffer_ms(&self) -> u64 {
        self.max_buffer_secs.saturating_mul(1000)
    }

    /// Rejects settings the loop cannot run with.
    pub fn validate(&self) -> PlayerResult<()> {
        if self.max_buffer_secs == 0 {
            return Err(PlayerError::Config("maximum buffer must be positive".into()));
        }
        if let Some(rule) = self.replacement {
            if rule.replace_segment < 2 || rule.replace_segment >= rule.at_segment {
                return Err(PlayerError::Config(format!(
                    "replacement of segment {} at segment {} needs 2 <= replaced < trigger",
                    rule.replace_segment, rule.at_segment
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.abr.exp_ratio) || self.abr.exp_ratio == 0.0 {
            return Err(PlayerError::Config(format!(
                "exponential ratio {} outside (0, 1]",
                self.abr.exp_ratio
            )));
        }
        Ok(())
    }
}
