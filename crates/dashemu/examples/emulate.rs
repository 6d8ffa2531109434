//! Stream a four-rung template ladder from a DASH origin.
//!
//! ```
//! cargo run -p dashemu --example emulate -- config.json http://localhost:8080/video/
//! ```
//!
//! The origin must serve `v_<bandwidth>_<number>.m4s` for 30 two-second
//! segments.

use std::{env::args, error::Error};

use dashemu::prelude::*;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, metadata::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const LADDER: [(u64, u32); 4] = [
    (4_000_000, 1080),
    (2_000_000, 720),
    (1_000_000, 480),
    (500_000, 360),
];

fn manifest(base_url: Url) -> Result<Manifest, Box<dyn Error + Send + Sync>> {
    let variants = LADDER
        .iter()
        .map(|&(bandwidth_bps, height)| {
            let rendition = Rendition {
                bandwidth_bps,
                width: height * 16 / 9,
                height,
                frame_rate: 30,
                codec: "avc1.64001f".to_string(),
            };
            (rendition, SegmentSource::template("v_$Bandwidth$_$Number$.m4s"))
        })
        .collect();
    let video = TrackManifest::new(TrackKind::Video, "video/mp4", variants)?;
    Ok(Manifest::new(base_url, 2000, 60_000, vec![video])?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("dashemu_player=debug".parse()?)
                .add_directive("dashemu_net=warn".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let config = match args().nth(1) {
        Some(path) => EmulatorConfig::from_path(path)?,
        None => EmulatorConfig::default(),
    };
    let base_url: Url = args()
        .nth(2)
        .unwrap_or_else(|| "http://127.0.0.1:8080/video/".to_string())
        .parse()?;

    info!(%base_url, adapt = %config.adapt, "Starting emulation");

    let emulator = Emulator::new(config)?;
    let mut session = emulator.session(vec![manifest(base_url)?])?;
    let mut events_rx = session.events().subscribe();
    let report = session.run().await?;

    loop {
        match events_rx.try_recv() {
            Ok(ev) => info!(?ev),
            Err(TryRecvError::Lagged(n)) => warn!(n, "events lagged"),
            Err(_) => break,
        }
    }

    for track in &report.tracks {
        for entry in track.log.iter() {
            info!(
                segment = entry.segment,
                rendition = entry.rendition,
                bandwidth = entry.bandwidth_bps,
                buffer_ms = entry.buffer_ms,
                stall_ms = entry.stall_ms,
                "segment"
            );
        }
        info!(
            track = track.track,
            segments = track.log.len(),
            stall_total_ms = track.stall_total_ms,
            "Track done"
        );
    }
    Ok(())
}
