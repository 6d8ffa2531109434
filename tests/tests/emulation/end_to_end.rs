use dashemu::{
    EmulatorError,
    net::NetError,
    player::{PlayerError, TrackKind},
    prelude::*,
};
use rstest::rstest;

use crate::common::{Origin, audio_track, manifest, video_track};

fn emulator(json: &str) -> Emulator {
    dashemu_test_utils::init_tracing();
    Emulator::new(EmulatorConfig::from_json_str(json).unwrap()).unwrap()
}

#[rstest]
#[case("conventional")]
#[case("elastic")]
#[case("logistic")]
#[case("bba")]
#[case("arbiter")]
#[case("average")]
#[case("geometric")]
#[case("exponential")]
#[tokio::test]
async fn every_algorithm_streams_the_whole_presentation(#[case] adapt: &str) {
    let origin = Origin::default();
    let server = origin.clone().serve().await;
    let emulator = emulator(&format!(r#"{{"adapt": "{adapt}", "maxBuffer": 60}}"#));

    let report = emulator
        .run(vec![manifest(server.base_url(), 8, vec![video_track()])])
        .await
        .unwrap();

    let track = &report.tracks[0];
    let segments: Vec<u64> = track.log.iter().map(|e| e.segment).collect();
    assert_eq!(segments, (1..=8).collect::<Vec<_>>());
    assert!(track.log.iter().all(|e| e.size_bytes > 0));
    assert!(track.log.iter().all(|e| e.algorithm.name() == adapt));
    assert!(origin.requests() >= 8);
}

#[tokio::test]
async fn audio_and_video_tracks_advance_together() {
    let origin = Origin::default();
    let server = origin.clone().serve().await;
    let emulator = emulator(r#"{"adapt": "conventional", "codec": "h264"}"#);

    let report = emulator
        .run(vec![manifest(
            server.base_url(),
            6,
            vec![video_track(), audio_track(6)],
        )])
        .await
        .unwrap();

    assert_eq!(report.tracks.len(), 2);
    assert_eq!(report.segments(), 12);
    let audio = &report.tracks[1];
    assert_eq!(audio.kind, TrackKind::Audio);
    assert!(audio.log.iter().all(|e| e.size_bytes == 16_000));
    // 6 video, 1 audio init and 6 audio segments
    assert_eq!(origin.requests(), 13);
}

#[tokio::test]
async fn configured_stream_duration_shortens_the_run() {
    let origin = Origin::default();
    let server = origin.clone().serve().await;
    let emulator = emulator(r#"{"streamDuration": 6}"#);

    let report = emulator
        .run(vec![manifest(server.base_url(), 10, vec![video_track()])])
        .await
        .unwrap();

    assert_eq!(report.tracks[0].log.len(), 3);
}

#[tokio::test]
async fn replacement_rewrites_an_earlier_segment() {
    let origin = Origin::default();
    let server = origin.clone().serve().await;
    let emulator = emulator(r#"{"hls": "on", "replaceAtSegment": 4, "replaceSegment": 3}"#);

    let report = emulator
        .run(vec![manifest(server.base_url(), 6, vec![video_track()])])
        .await
        .unwrap();

    let log = &report.tracks[0].log;
    assert_eq!(log.len(), 6);
    assert!(log.get(3).unwrap().replaced);
    assert_eq!(log.iter().filter(|e| e.replaced).count(), 1);
}

#[tokio::test]
async fn missing_segment_ends_the_run() {
    let origin = Origin::failing_at(3);
    let server = origin.clone().serve().await;
    let emulator = emulator("{}");

    let err = emulator
        .run(vec![manifest(server.base_url(), 6, vec![video_track()])])
        .await
        .unwrap_err();

    assert!(
        matches!(
            &err,
            EmulatorError::Player(PlayerError::Net(NetError::HttpStatus { status: 404, .. }))
        ),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn session_events_cover_every_segment() {
    let origin = Origin::default();
    let server = origin.clone().serve().await;
    let emulator = emulator("{}");
    let mut session = emulator
        .session(vec![manifest(server.base_url(), 4, vec![video_track()])])
        .unwrap();
    let mut events = session.events().subscribe();

    session.run().await.unwrap();

    let mut completed = 0;
    let mut finished = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::Track(TrackEvent::SegmentComplete { .. }) => completed += 1,
            Event::Session(SessionEvent::Finished { segments }) => {
                assert_eq!(segments, 4);
                finished = true;
            }
            _ => {}
        }
    }
    assert_eq!(completed, 4);
    assert!(finished);
}
