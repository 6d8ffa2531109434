//! Local DASH origin serving synthetic segments.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use dashemu::{net::RangeSpec, prelude::*};
use dashemu_test_utils::{TestHttpServer, segment_bytes};
use url::Url;

pub const SEGMENT_MS: u64 = 2000;
pub const LADDER: [u64; 3] = [800_000, 400_000, 200_000];

/// Counts requests and optionally fails one segment number.
#[derive(Clone, Default)]
pub struct Origin {
    pub requests: Arc<AtomicUsize>,
    pub fail_segment: Option<u64>,
}

impl Origin {
    pub fn failing_at(segment: u64) -> Self {
        Self {
            fail_segment: Some(segment),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn serve(self) -> TestHttpServer {
        TestHttpServer::new(
            Router::new()
                .route("/video/{name}", get(template_segment))
                .route("/audio.mp4", get(ranged_file))
                .with_state(self),
        )
        .await
    }
}

fn body(len: usize) -> Response {
    ([(header::CONTENT_LENGTH, len.to_string())], vec![0_u8; len]).into_response()
}

/// `v_<bandwidth>_<number>.m4s`, sized to the declared bitrate.
async fn template_segment(State(origin): State<Origin>, Path(name): Path<String>) -> Response {
    origin.requests.fetch_add(1, Ordering::SeqCst);
    let Some((bandwidth, number)) = name
        .strip_prefix("v_")
        .and_then(|rest| rest.strip_suffix(".m4s"))
        .and_then(|rest| rest.split_once('_'))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let (Ok(bandwidth), Ok(number)) = (bandwidth.parse::<u64>(), number.parse::<u64>()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if origin.fail_segment == Some(number) {
        return StatusCode::NOT_FOUND.into_response();
    }
    body(segment_bytes(bandwidth, SEGMENT_MS))
}

/// Single audio file honouring `Range`.
async fn ranged_file(State(origin): State<Origin>, headers: HeaderMap) -> Response {
    origin.requests.fetch_add(1, Ordering::SeqCst);
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<RangeSpec>().ok());
    match range.and_then(|r| r.len()) {
        Some(len) => {
            let mut response = body(usize::try_from(len).unwrap());
            *response.status_mut() = StatusCode::PARTIAL_CONTENT;
            response
        }
        None => body(64_000),
    }
}

pub fn video_track() -> TrackManifest {
    let variants = LADDER
        .iter()
        .zip([720_u32, 480, 360])
        .map(|(&bandwidth_bps, height)| {
            let rendition = Rendition {
                bandwidth_bps,
                width: height * 16 / 9,
                height,
                frame_rate: 30,
                codec: "avc1.64001f".into(),
            };
            (
                rendition,
                SegmentSource::template("video/v_$Bandwidth$_$Number$.m4s"),
            )
        })
        .collect();
    TrackManifest::new(TrackKind::Video, "video/mp4", variants).unwrap()
}

/// One 64 kbps rendition; segment `n` is bytes `[n * 16000, n * 16000 + 15999]`.
pub fn audio_track(segments: u64) -> TrackManifest {
    let rendition = Rendition {
        codec: "mp4a.40.2".into(),
        ..Rendition::with_bandwidth(64_000)
    };
    let ranges = (1..=segments)
        .map(|n| RangeSpec::new(n * 16_000, Some(n * 16_000 + 15_999)))
        .collect();
    TrackManifest::new(
        TrackKind::Audio,
        "audio/mp4",
        vec![(
            rendition,
            SegmentSource::ByteRanges {
                url: "audio.mp4".into(),
                init: Some(RangeSpec::new(0, Some(15_999))),
                ranges,
            },
        )],
    )
    .unwrap()
}

pub fn manifest(base_url: &Url, segments: u64, tracks: Vec<TrackManifest>) -> Manifest {
    Manifest::new(base_url.clone(), SEGMENT_MS, segments * SEGMENT_MS, tracks).unwrap()
}
