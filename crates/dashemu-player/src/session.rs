use std::time::Duration;

use dashemu_abr::{AbrController, AbrDecision, DecisionContext, Ladder, Rendition};
use dashemu_events::{EventBus, SessionEvent, TrackEvent};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::{
    PlayerConfig, PlayerError, PlayerResult, ReplacementRule,
    fetch::{FetchedSegment, SegmentFetcher, SegmentRequest, TrackProbe},
    log::{QoeCounters, SegmentLog, SegmentLogEntry},
    manifest::{Manifest, TrackKind},
    peer::{NoPeers, PeerResolver},
    playout::PlayoutLog,
    replacement,
    selector::ManifestSelector,
    state::{StreamState, millis},
};

/// Lifecycle of a [`Session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Downloading initialization segments; no buffer accounting.
    Initializing,
    Streaming,
    /// Downloads are over; remaining segments are played out.
    Draining,
    Done,
}

/// Outcome of one track.
#[derive(Clone, Debug)]
pub struct TrackReport {
    pub track: usize,
    pub kind: TrackKind,
    pub mime_type: String,
    pub log: SegmentLog,
    pub playout: PlayoutLog,
    pub stall_total_ms: u64,
}

#[derive(Clone, Debug)]
pub struct SessionReport {
    pub tracks: Vec<TrackReport>,
}

impl SessionReport {
    #[must_use]
    pub fn segments(&self) -> usize {
        self.tracks.iter().map(|t| t.log.len()).sum()
    }
}

struct Completed {
    segment: u64,
    segment_ms: u64,
    rendition: usize,
    arrival_ms: u64,
    delivery_ms: u64,
    fetched: FetchedSegment,
}

struct TrackRun {
    track: usize,
    kind: TrackKind,
    mime_type: String,
    state: StreamState,
    log: SegmentLog,
    playout: PlayoutLog,
    replaced: bool,
}

/// Emulated playback of every track of a presentation.
///
/// Tracks advance one segment each per pass, in order. Every step downloads
/// a segment through the [`SegmentFetcher`], updates the simulated buffer,
/// pauses while the buffer is over its maximum and asks the rate selection
/// strategy for the next rendition.
pub struct Session<F, P = NoPeers> {
    config: PlayerConfig,
    manifests: Vec<Manifest>,
    fetcher: F,
    peers: P,
    controller: AbrController,
    selector: ManifestSelector,
    bus: EventBus,
    phase: Phase,
}

impl<F: SegmentFetcher> Session<F> {
    /// Validates `config` against `manifests`.
    ///
    /// With a configured codec, video tracks of other codecs are dropped.
    pub fn new(
        config: PlayerConfig,
        mut manifests: Vec<Manifest>,
        fetcher: F,
    ) -> PlayerResult<Self> {
        config.validate()?;
        let Some(first) = manifests.first() else {
            return Err(PlayerError::Config("no manifest given".into()));
        };
        let tracks = first.tracks.len();
        if let Some(codec) = &config.codec {
            for manifest in &mut manifests {
                manifest.retain_codec(codec)?;
            }
        }
        if manifests.iter().any(|m| m.tracks.len() != tracks) {
            return Err(PlayerError::Manifest(
                "manifests disagree on the number of tracks".into(),
            ));
        }

        Ok(Self {
            controller: AbrController::new(config.abr.clone()),
            selector: ManifestSelector::new(config.rng_seed),
            bus: EventBus::new(config.events_channel_capacity),
            config,
            manifests,
            fetcher,
            peers: NoPeers,
            phase: Phase::Initializing,
        })
    }
}

impl<F: SegmentFetcher, P: PeerResolver> Session<F, P> {
    /// Consults `peers` before every download.
    pub fn with_peers<Q: PeerResolver>(self, peers: Q) -> Session<F, Q> {
        Session {
            config: self.config,
            manifests: self.manifests,
            fetcher: self.fetcher,
            peers,
            controller: self.controller,
            selector: self.selector,
            bus: self.bus,
            phase: self.phase,
        }
    }

    /// Bus carrying the session events; subscribe before [`Session::run`].
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Streams every track until its duration is exhausted.
    ///
    /// # Errors
    ///
    /// Any fetch or rate selection failure ends the session.
    pub async fn run(&mut self) -> PlayerResult<SessionReport> {
        self.phase = Phase::Initializing;
        let mut runs = self.track_runs()?;
        info!(
            tracks = runs.len(),
            manifests = self.manifests.len(),
            algorithm = %self.config.algorithm,
            "session started"
        );
        self.bus.publish(SessionEvent::Started { tracks: runs.len() });

        for run in &runs {
            self.fetch_init(run).await?;
        }

        self.phase = Phase::Streaming;
        let started = Instant::now();
        for run in &mut runs {
            run.state.last_run = started;
        }
        loop {
            let mut active = false;
            for run in &mut runs {
                if run.state.finished {
                    continue;
                }
                active = true;
                self.step(run, started).await?;
            }
            if !active {
                break;
            }
        }

        self.phase = Phase::Draining;
        let initial_buffer = self.config.initial_buffer_segments;
        for run in &mut runs {
            for segment in run.playout.drain(initial_buffer, &mut run.log) {
                self.bus.publish(TrackEvent::PlayoutReady {
                    track: run.track,
                    segment,
                });
            }
        }

        self.phase = Phase::Done;
        let report = SessionReport {
            tracks: runs
                .into_iter()
                .map(|run| TrackReport {
                    track: run.track,
                    kind: run.kind,
                    mime_type: run.mime_type,
                    stall_total_ms: run.state.stall_total_ms,
                    log: run.log,
                    playout: run.playout,
                })
                .collect(),
        };
        let segments = report.segments();
        info!(segments, elapsed_ms = millis(started.elapsed()), "session finished");
        self.bus.publish(SessionEvent::Finished { segments });
        Ok(report)
    }

    fn track_runs(&self) -> PlayerResult<Vec<TrackRun>> {
        let Some(manifest) = self.manifests.first() else {
            return Err(PlayerError::Config("no manifest given".into()));
        };
        Ok(manifest
            .tracks
            .iter()
            .enumerate()
            .map(|(track, t)| TrackRun {
                track,
                kind: t.kind,
                mime_type: t.mime_type.clone(),
                state: StreamState::new(self.config.algorithm, t.ladder().lowest_index(), 0),
                log: SegmentLog::new(),
                playout: PlayoutLog::new(),
                replaced: false,
            })
            .collect())
    }

    fn manifest(&self, index: usize) -> PlayerResult<&Manifest> {
        self.manifests
            .get(index)
            .ok_or_else(|| PlayerError::Manifest(format!("no manifest {index}")))
    }

    fn stream_duration_ms(&self, manifest: &Manifest) -> u64 {
        self.config
            .stream_duration_ms
            .map_or(manifest.stream_duration_ms, |d| d.min(manifest.stream_duration_ms))
    }

    async fn download(&self, request: &SegmentRequest) -> PlayerResult<(FetchedSegment, u64)> {
        let request = match self.peers.resolve(request).await {
            Some(peer) => {
                debug!(origin = %request.url, %peer, "downloading from peer");
                request.with_url(peer)
            }
            None => request.clone(),
        };
        let start = Instant::now();
        let fetched = self.fetcher.fetch(&request).await?;
        Ok((fetched, millis(start.elapsed())))
    }

    async fn fetch_init(&self, run: &TrackRun) -> PlayerResult<()> {
        let manifest = self.manifest(run.state.manifest_index)?;
        if let Some(request) = manifest.init_request(run.track, run.state.rendition)? {
            let (fetched, delivery_ms) = self.download(&request).await?;
            debug!(
                track = run.track,
                bytes = fetched.size,
                delivery_ms,
                "initialization segment downloaded"
            );
        }
        Ok(())
    }

    fn finish(&self, run: &mut TrackRun) {
        run.state.finished = true;
        let segments = run.log.len() as u64;
        debug!(track = run.track, segments, "stream duration exhausted");
        self.bus.publish(TrackEvent::EndOfTrack {
            track: run.track,
            segments,
        });
    }

    fn replacement_due(&self, run: &TrackRun) -> Option<ReplacementRule> {
        let rule = self.config.replacement?;
        (!run.replaced && replacement::triggers(&rule, run.kind, run.state.segment_number))
            .then_some(rule)
    }

    async fn step(&mut self, run: &mut TrackRun, started: Instant) -> PlayerResult<()> {
        if let Some(rule) = self.replacement_due(run) {
            run.replaced = true;
            self.replace(run, rule, started).await?;
        }

        let manifest = self.manifest(run.state.manifest_index)?;
        let segment_ms = manifest.segment_duration_ms;
        let stream_ms = self.stream_duration_ms(manifest);
        if run.state.played_ms + segment_ms > stream_ms {
            self.finish(run);
            return Ok(());
        }

        let ladder = manifest.track(run.track)?.ladder();
        let ceiling = self.ceiling(ladder);
        if run.state.rendition < ceiling {
            warn!(
                track = run.track,
                requested = run.state.rendition,
                ceiling,
                "rendition above quality ceiling, clamping"
            );
            run.state.rendition = ceiling;
        }
        let rendition = run.state.rendition.min(ladder.lowest_index());
        let segment = run.state.segment_number;

        let request = manifest.segment_request(run.track, rendition, segment)?;
        let (fetched, delivery_ms) = self.download(&request).await?;
        let completed = Completed {
            segment,
            segment_ms,
            rendition,
            arrival_ms: millis(started.elapsed()),
            delivery_ms,
            fetched,
        };
        let elapsed_ms = run.state.lap();
        let (stall_ms, play_position_ms) = self.absorb(run, &completed, elapsed_ms).await;
        let sample_bps = self.log_segment(
            run,
            ladder.rendition(rendition)?,
            completed,
            stall_ms,
            play_position_ms,
        );

        let ctx = DecisionContext {
            sample_bps,
            delivery_ms,
            buffer_ms: run.state.buffer_ms,
            max_buffer_secs: self.config.max_buffer_secs,
            segment_duration_ms: segment_ms,
            segment_number: segment,
            stream_duration_ms: stream_ms,
            last_index: rendition,
            ceiling_index: ceiling,
        };
        let decision = self.decide(&mut run.state, run.track, manifest, &ctx).await?;
        if decision.changed {
            self.bus.publish(TrackEvent::RenditionSwitch {
                track: run.track,
                from: rendition,
                to: decision.target_rendition,
                reason: decision.reason,
            });
        }
        run.state.rendition = decision.target_rendition;

        self.advance(run, segment_ms, stream_ms)
    }

    /// Buffer bookkeeping of a finished download: playout, stall detection
    /// and backpressure. Returns the stall and the extended-log play position.
    async fn absorb(
        &self,
        run: &mut TrackRun,
        completed: &Completed,
        elapsed_ms: u64,
    ) -> (u64, Option<u64>) {
        let initial_buffer = self.config.initial_buffer_segments;
        let segment = completed.segment;

        if run.state.is_playing(initial_buffer) {
            for played in run
                .playout
                .advance(completed.arrival_ms, initial_buffer, &mut run.log)
            {
                self.bus.publish(TrackEvent::PlayoutReady {
                    track: run.track,
                    segment: played,
                });
            }
        }

        let stall_ms = run
            .state
            .absorb_segment(elapsed_ms, completed.segment_ms, initial_buffer);
        if stall_ms > 0 {
            debug!(track = run.track, segment, stall_ms, "playback stalled");
            self.bus.publish(TrackEvent::Stall {
                track: run.track,
                segment,
                stall_ms,
            });
        }

        self.backpressure(run.track, &mut run.state, segment).await;

        let played_through_ms = run.state.played_ms + completed.segment_ms;
        let play_position_ms = (self.config.extended_log
            && initial_buffer < run.state.wait_to_play)
            .then(|| played_through_ms.saturating_sub(run.state.buffer_ms));
        run.state.played_ms += completed.segment_ms;
        (stall_ms, play_position_ms)
    }

    /// Pauses downloads while `state` holds more than the maximum buffer.
    async fn backpressure(&self, track: usize, state: &mut StreamState, segment: u64) {
        if let Some(sleep_ms) = state.take_backpressure(self.config.max_buffer_ms()) {
            debug!(track, segment, sleep_ms, "buffer full, pausing downloads");
            self.bus.publish(TrackEvent::Backpressure {
                track,
                segment,
                sleep_ms,
            });
            sleep(Duration::from_millis(sleep_ms)).await;
        }
    }

    /// Appends the record of a finished download and returns its throughput.
    fn log_segment(
        &self,
        run: &mut TrackRun,
        current: &Rendition,
        completed: Completed,
        stall_ms: u64,
        play_position_ms: Option<u64>,
    ) -> u64 {
        let Completed {
            segment,
            segment_ms,
            rendition,
            arrival_ms,
            delivery_ms,
            fetched,
        } = completed;
        let bits = fetched.size.saturating_mul(8 * 1000);
        let delivery_rate_bps = bits / delivery_ms.max(1);
        let qoe = QoeCounters::advance(
            run.log.last().map(|e| (&e.qoe, e.bandwidth_bps)),
            current.bandwidth_bps,
            stall_ms,
        );

        run.log.record(SegmentLogEntry {
            segment,
            arrival_ms,
            delivery_ms,
            stall_ms,
            rendition,
            bandwidth_bps: current.bandwidth_bps,
            delivery_rate_bps,
            actual_rate_bps: bits / segment_ms.max(1),
            size_bytes: fetched.size,
            buffer_ms: run.state.buffer_ms,
            algorithm: self.config.algorithm,
            segment_duration_ms: segment_ms,
            codec: current.codec.clone(),
            width: current.width,
            height: current.height,
            frame_rate: current.frame_rate,
            play_start_ms: run.state.played_ms,
            play_position_ms,
            rtt_ms: millis(fetched.rtt),
            protocol: fetched.protocol,
            manifest_index: run.state.manifest_index,
            track: run.track,
            replaced: false,
            played: false,
            qoe,
        });
        debug!(
            track = run.track,
            segment,
            rendition,
            bytes = fetched.size,
            delivery_ms,
            buffer_ms = run.state.buffer_ms,
            "segment downloaded"
        );
        self.bus.publish(TrackEvent::SegmentComplete {
            track: run.track,
            segment,
            rendition,
            bytes: fetched.size,
            delivery_ms,
            throughput_bps: delivery_rate_bps,
            buffer_ms: run.state.buffer_ms,
        });
        delivery_rate_bps
    }

    /// Moves the track to its next segment, possibly in another manifest.
    fn advance(&mut self, run: &mut TrackRun, segment_ms: u64, stream_ms: u64) -> PlayerResult<()> {
        let durations: Vec<u64> = self
            .manifests
            .iter()
            .map(|m| m.segment_duration_ms)
            .collect();
        let Some(next) = self
            .selector
            .next(&durations, segment_ms, run.state.played_ms, stream_ms)
        else {
            self.finish(run);
            return Ok(());
        };

        if next.manifest != run.state.manifest_index {
            let lowest = self
                .manifest(next.manifest)?
                .track(run.track)?
                .ladder()
                .lowest_index();
            info!(
                track = run.track,
                from = run.state.manifest_index,
                to = next.manifest,
                next_segment = next.segment,
                "switching manifest"
            );
            self.bus.publish(TrackEvent::ManifestSwitch {
                track: run.track,
                from: run.state.manifest_index,
                to: next.manifest,
                next_segment: next.segment,
            });
            run.state.manifest_index = next.manifest;
            run.state.rendition = run.state.rendition.min(lowest);
        }
        run.state.segment_number = next.segment;
        Ok(())
    }

    /// Feeds a finished download to the strategy of `state`.
    async fn decide(
        &self,
        state: &mut StreamState,
        track: usize,
        manifest: &Manifest,
        ctx: &DecisionContext,
    ) -> PlayerResult<AbrDecision> {
        let ladder = manifest.track(track)?.ladder();
        let probe = TrackProbe {
            fetcher: &self.fetcher,
            manifest,
            track,
        };
        Ok(self
            .controller
            .decide(
                &mut state.algorithm,
                &mut state.history,
                ladder,
                ctx,
                &probe,
            )
            .await?)
    }

    fn ceiling(&self, ladder: &Ladder) -> usize {
        self.config
            .max_height
            .map_or(0, |height| ladder.ceiling_index(height))
    }

    /// Downloads `rule.replace_segment` again at the current rendition and
    /// rewrites the buffer history after it.
    ///
    /// The re-fetch goes through the regular step bookkeeping on top of the
    /// level its predecessor left, without initial buffering: stall
    /// detection, backpressure and a strategy decision.
    async fn replace(
        &self,
        run: &mut TrackRun,
        rule: ReplacementRule,
        started: Instant,
    ) -> PlayerResult<()> {
        let target_segment = rule.replace_segment;
        let (Some(previous), Some(target)) = (
            run.log.get(target_segment - 1),
            run.log.get(target_segment),
        ) else {
            warn!(
                track = run.track,
                segment = target_segment,
                "replacement skipped: segment not downloaded"
            );
            return Ok(());
        };
        let mut replay = replacement::rewind(&run.state, previous.buffer_ms);
        let mut entry = target.clone();

        let Some(manifest) = self.manifests.get(entry.manifest_index) else {
            warn!(
                track = run.track,
                manifest = entry.manifest_index,
                "replacement skipped: unknown manifest"
            );
            return Ok(());
        };
        let Ok(track) = manifest.track(run.track) else {
            warn!(track = run.track, "replacement skipped: unknown adaptation set");
            return Ok(());
        };
        let ladder = track.ladder();
        let rendition = run.state.rendition.min(ladder.lowest_index());

        let request = manifest.segment_request(run.track, rendition, target_segment)?;
        let (fetched, delivery_ms) = self.download(&request).await?;
        let elapsed_ms = millis(run.state.last_run.elapsed());
        entry.stall_ms = replay.absorb_segment(elapsed_ms, entry.segment_duration_ms, 0);
        self.backpressure(run.track, &mut replay, target_segment).await;

        let sample_bps = replacement::refill(
            &mut entry,
            ladder.rendition(rendition)?,
            rendition,
            fetched,
            delivery_ms,
        );
        entry.arrival_ms = millis(started.elapsed());
        entry.buffer_ms = replay.buffer_ms;

        let ctx = DecisionContext {
            sample_bps,
            delivery_ms,
            buffer_ms: replay.buffer_ms,
            max_buffer_secs: self.config.max_buffer_secs,
            segment_duration_ms: entry.segment_duration_ms,
            segment_number: target_segment,
            stream_duration_ms: self.stream_duration_ms(manifest),
            last_index: rendition,
            ceiling_index: self.ceiling(ladder),
        };
        let decision = self.decide(&mut run.state, run.track, manifest, &ctx).await?;
        if decision.changed {
            self.bus.publish(TrackEvent::RenditionSwitch {
                track: run.track,
                from: rendition,
                to: decision.target_rendition,
                reason: decision.reason,
            });
        }
        run.state.rendition = decision.target_rendition;

        let runtime_ms = millis(run.state.last_run.elapsed());
        let buffer_difference_ms =
            replacement::splice(&mut run.log, &mut run.state, entry, runtime_ms);
        run.state.last_run = Instant::now();

        info!(
            track = run.track,
            segment = target_segment,
            rendition,
            next_rendition = decision.target_rendition,
            buffer_difference_ms,
            runtime_ms,
            "segment replaced"
        );
        self.bus.publish(TrackEvent::SegmentReplaced {
            track: run.track,
            segment: target_segment,
            rendition,
            buffer_difference_ms,
        });
        Ok(())
    }
}
