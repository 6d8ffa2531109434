//! JSON configuration of an emulator run.

use std::{path::Path, time::Duration};

use dashemu_abr::{AbrOptions, Algorithm};
use dashemu_net::{NetOptions, RetryPolicy};
use dashemu_player::{PlayerConfig, ReplacementRule};
use serde::Deserialize;

use crate::{EmulatorError, EmulatorResult};

/// Settings of one run, using the field names of the emulator config file.
///
/// ```json
/// { "adapt": "bba", "codec": "h264", "initBuffer": 2, "maxBuffer": 30,
///   "maxHeight": 1080, "streamDuration": 40, "hls": "on", "expRatio": 0.4 }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmulatorConfig {
    /// Rate selection strategy name.
    pub adapt: String,
    /// Video codec to stream.
    pub codec: Option<String>,
    /// Segments downloaded before playback starts.
    pub init_buffer: u64,
    /// Maximum buffer, in seconds.
    pub max_buffer: u64,
    pub max_height: Option<u32>,
    /// Seconds of media to stream; the whole manifest when absent.
    pub stream_duration: Option<u64>,
    /// `on` enables segment replacement.
    pub hls: String,
    /// Trigger of segment replacement when `hls` is on.
    pub replace_at_segment: Option<u64>,
    pub replace_segment: Option<u64>,
    /// Ratio of the exponential strategies; library default when absent or 0.
    pub exp_ratio: Option<f64>,
    /// Record the playback position of every segment.
    pub extend_print_log: bool,
    /// Seed for choosing among manifests.
    pub seed: Option<u64>,
    /// Per-request timeout, in seconds.
    pub request_timeout: u64,
    /// Attempts after a failed request, one second apart.
    pub max_retries: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            adapt: Algorithm::Conventional.name().to_string(),
            codec: None,
            init_buffer: 2,
            max_buffer: 60,
            max_height: None,
            stream_duration: None,
            hls: "off".to_string(),
            replace_at_segment: None,
            replace_segment: None,
            exp_ratio: None,
            extend_print_log: false,
            seed: None,
            request_timeout: 30,
            max_retries: 5,
        }
    }
}

impl EmulatorConfig {
    pub fn from_json_str(json: &str) -> EmulatorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> EmulatorResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EmulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn replacement(&self) -> EmulatorResult<Option<ReplacementRule>> {
        match self.hls.trim().to_ascii_lowercase().as_str() {
            "off" | "" => Ok(None),
            "on" => {
                let default = ReplacementRule::default();
                Ok(Some(ReplacementRule {
                    at_segment: self.replace_at_segment.unwrap_or(default.at_segment),
                    replace_segment: self.replace_segment.unwrap_or(default.replace_segment),
                }))
            }
            other => Err(EmulatorError::Config(format!(
                "hls must be \"on\" or \"off\", got {other:?}"
            ))),
        }
    }

    /// Playback settings; unknown strategy names are rejected here.
    pub fn player_config(&self) -> EmulatorResult<PlayerConfig> {
        let algorithm: Algorithm = self.adapt.parse()?;
        let mut abr = AbrOptions::default();
        if let Some(ratio) = self.exp_ratio.filter(|r| r.abs() > f64::EPSILON) {
            abr = abr.with_exp_ratio(ratio);
        }

        let config = PlayerConfig {
            algorithm,
            abr,
            initial_buffer_segments: self.init_buffer,
            max_buffer_secs: self.max_buffer,
            max_height: self.max_height,
            stream_duration_ms: self.stream_duration.map(|s| s.saturating_mul(1000)),
            codec: self.codec.clone(),
            replacement: self.replacement()?,
            extended_log: self.extend_print_log,
            rng_seed: self.seed,
            ..PlayerConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Transport settings.
    #[must_use]
    pub fn net_options(&self) -> NetOptions {
        NetOptions::default()
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_retry_policy(RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            })
    }
}
