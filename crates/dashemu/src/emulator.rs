use dashemu_net::{HttpClient, NetExt, RetryNet};
use dashemu_player::{HttpSegmentFetcher, Manifest, PlayerConfig, Session, SessionReport};
use tracing::info;

use crate::{EmulatorConfig, EmulatorResult};

/// Fetcher used by emulator sessions: HTTP with bounded retries.
pub type EmulatorFetcher = HttpSegmentFetcher<RetryNet<HttpClient>>;

/// Validated settings plus the HTTP stack built from them.
#[derive(Debug)]
pub struct Emulator {
    config: EmulatorConfig,
    player: PlayerConfig,
}

impl Emulator {
    /// Validates `config`; nothing touches the network yet.
    pub fn new(config: EmulatorConfig) -> EmulatorResult<Self> {
        let player = config.player_config()?;
        Ok(Self { config, player })
    }

    #[must_use]
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    #[must_use]
    pub fn player_config(&self) -> &PlayerConfig {
        &self.player
    }

    /// Session over `manifests` with a fresh HTTP client.
    pub fn session(&self, manifests: Vec<Manifest>) -> EmulatorResult<Session<EmulatorFetcher>> {
        let options = self.config.net_options();
        let policy = options.retry_policy.clone();
        let net = HttpClient::new(options)?.with_retry(policy);
        Ok(Session::new(
            self.player.clone(),
            manifests,
            HttpSegmentFetcher::new(net),
        )?)
    }

    /// Streams `manifests` to the end.
    pub async fn run(&self, manifests: Vec<Manifest>) -> EmulatorResult<SessionReport> {
        let mut session = self.session(manifests)?;
        info!(
            algorithm = %self.player.algorithm,
            init_buffer = self.player.initial_buffer_segments,
            max_buffer_secs = self.player.max_buffer_secs,
            "emulation starting"
        );
        let report = session.run().await?;
        for track in &report.tracks {
            info!(
                track = track.track,
                mime = %track.mime_type,
                segments = track.log.len(),
                stall_ms = track.stall_total_ms,
                "track finished"
            );
        }
        Ok(report)
    }
}
