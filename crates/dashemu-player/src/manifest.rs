use dashemu_abr::{Ladder, Rendition};
use dashemu_net::RangeSpec;
use tracing::debug;
use url::Url;

use crate::{PlayerError, PlayerResult, fetch::SegmentRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Codec family of a codec string, as named in configuration.
///
/// `avc1.64001f` is `h264`, `hev1`/`hvc1` are `h265`, `vp09` is `vp9`,
/// `av01` is `av1` and `mp4a`/`ac-3` are `audio`.
#[must_use]
pub fn codec_family(codec: &str) -> Option<&'static str> {
    let codec = codec.to_ascii_lowercase();
    let family = if codec.contains("avc") {
        "h264"
    } else if codec.contains("hev") || codec.contains("hvc1") {
        "h265"
    } else if codec.contains("vp") {
        "vp9"
    } else if codec.contains("av01") || codec.contains("av1") {
        "av1"
    } else if codec.contains("mp4a") || codec.contains("ac-3") {
        "audio"
    } else {
        return None;
    };
    Some(family)
}

/// How the media segments of one rendition are addressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentSource {
    /// One URL per segment. `media` may contain `$Number$` and `$Bandwidth$`;
    /// segment 1 maps to `start_number`.
    Template {
        media: String,
        init: Option<String>,
        start_number: u64,
    },
    /// Every segment is a byte range of a single file.
    ByteRanges {
        url: String,
        init: Option<RangeSpec>,
        ranges: Vec<RangeSpec>,
    },
}

impl SegmentSource {
    #[must_use]
    pub fn template<S: Into<String>>(media: S) -> Self {
        Self::Template {
            media: media.into(),
            init: None,
            start_number: 1,
        }
    }
}

fn expand_template(template: &str, number: u64, bandwidth_bps: u64) -> String {
    template
        .replace("$Number$", &number.to_string())
        .replace("$Bandwidth$", &bandwidth_bps.to_string())
}

fn join(base: &Url, reference: &str) -> PlayerResult<Url> {
    base.join(reference).map_err(|e| PlayerError::InvalidUrl {
        url: reference.to_string(),
        reason: e.to_string(),
    })
}

/// One adaptation set: a ladder plus the segment source of each rung.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackManifest {
    pub kind: TrackKind,
    pub mime_type: String,
    ladder: Ladder,
    sources: Vec<SegmentSource>,
}

impl TrackManifest {
    /// Builds a track from `(rendition, source)` pairs in manifest order.
    ///
    /// Ascending lists are reversed together with their sources so that
    /// index 0 is the best rendition.
    pub fn new<S: Into<String>>(
        kind: TrackKind,
        mime_type: S,
        mut variants: Vec<(Rendition, SegmentSource)>,
    ) -> PlayerResult<Self> {
        let ascending = match (variants.first(), variants.last()) {
            (Some(first), Some(last)) => first.0.bandwidth_bps < last.0.bandwidth_bps,
            _ => false,
        };
        if ascending {
            variants.reverse();
        }
        let (renditions, sources): (Vec<_>, Vec<_>) = variants.into_iter().unzip();
        let ladder = Ladder::new(renditions)?;
        Ok(Self {
            kind,
            mime_type: mime_type.into(),
            ladder,
            sources,
        })
    }

    #[must_use]
    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    /// Codec family of the best rendition.
    #[must_use]
    pub fn codec_family(&self) -> Option<&'static str> {
        self.ladder.get(0).and_then(|r| codec_family(&r.codec))
    }

    fn source(&self, rendition: usize) -> PlayerResult<&SegmentSource> {
        self.ladder.rendition(rendition)?;
        self.sources
            .get(rendition)
            .ok_or_else(|| PlayerError::Manifest(format!("rendition {rendition} has no source")))
    }
}

/// A parsed presentation: tracks sharing one segment duration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub base_url: Url,
    pub segment_duration_ms: u64,
    pub stream_duration_ms: u64,
    pub tracks: Vec<TrackManifest>,
}

impl Manifest {
    pub fn new(
        base_url: Url,
        segment_duration_ms: u64,
        stream_duration_ms: u64,
        tracks: Vec<TrackManifest>,
    ) -> PlayerResult<Self> {
        if segment_duration_ms == 0 {
            return Err(PlayerError::Manifest("missing segment duration".into()));
        }
        if stream_duration_ms < segment_duration_ms {
            return Err(PlayerError::Manifest(format!(
                "stream of {stream_duration_ms} ms is shorter than one segment"
            )));
        }
        if tracks.is_empty() {
            return Err(PlayerError::Manifest("no adaptation sets".into()));
        }
        Ok(Self {
            base_url,
            segment_duration_ms,
            stream_duration_ms,
            tracks,
        })
    }

    #[must_use]
    pub fn segment_count(&self) -> u64 {
        self.stream_duration_ms / self.segment_duration_ms
    }

    pub fn track(&self, track: usize) -> PlayerResult<&TrackManifest> {
        self.tracks
            .get(track)
            .ok_or_else(|| PlayerError::Manifest(format!("no track {track}")))
    }

    /// Location of media segment `segment` (1-based) of `rendition`.
    pub fn segment_request(
        &self,
        track: usize,
        rendition: usize,
        segment: u64,
    ) -> PlayerResult<SegmentRequest> {
        let out_of_range = || PlayerError::SegmentOutOfRange {
            track,
            rendition,
            segment,
        };
        let manifest_track = self.track(track)?;
        if segment == 0 {
            return Err(out_of_range());
        }
        match manifest_track.source(rendition)? {
            SegmentSource::Template {
                media,
                start_number,
                ..
            } => {
                let number = start_number + segment - 1;
                let bandwidth = manifest_track.ladder.bandwidth(rendition);
                let url = join(&self.base_url, &expand_template(media, number, bandwidth))?;
                Ok(SegmentRequest::new(url))
            }
            SegmentSource::ByteRanges { url, ranges, .. } => {
                let slot = usize::try_from(segment - 1).map_err(|_| out_of_range())?;
                let range = ranges.get(slot).cloned().ok_or_else(out_of_range)?;
                Ok(SegmentRequest::ranged(join(&self.base_url, url)?, range))
            }
        }
    }

    /// Location of the initialization segment of `rendition`, if it has one.
    pub fn init_request(
        &self,
        track: usize,
        rendition: usize,
    ) -> PlayerResult<Option<SegmentRequest>> {
        let manifest_track = self.track(track)?;
        let request = match manifest_track.source(rendition)? {
            SegmentSource::Template { init: Some(init), .. } => {
                let bandwidth = manifest_track.ladder.bandwidth(rendition);
                let url = join(&self.base_url, &expand_template(init, 0, bandwidth))?;
                Some(SegmentRequest::new(url))
            }
            SegmentSource::ByteRanges {
                url,
                init: Some(range),
                ..
            } => Some(SegmentRequest::ranged(
                join(&self.base_url, url)?,
                range.clone(),
            )),
            _ => None,
        };
        Ok(request)
    }

    /// Drops video tracks not encoded with `codec`; audio tracks are kept
    /// and audio-only manifests are left untouched.
    ///
    /// `codec` is a family name (`h264`, `h265`, `vp9`, `av1`) or a codec
    /// string prefix.
    pub fn retain_codec(&mut self, codec: &str) -> PlayerResult<()> {
        if self.tracks.iter().all(|t| t.kind == TrackKind::Audio) {
            return Ok(());
        }
        let wanted = codec.trim().to_ascii_lowercase();
        let matches = |track: &TrackManifest| {
            track.codec_family() == Some(wanted.as_str())
                || track
                    .ladder
                    .get(0)
                    .is_some_and(|r| r.codec.to_ascii_lowercase().starts_with(&wanted))
        };
        if !self
            .tracks
            .iter()
            .any(|t| t.kind == TrackKind::Video && matches(t))
        {
            return Err(PlayerError::CodecNotFound(codec.to_string()));
        }
        let before = self.tracks.len();
        self.tracks
            .retain(|t| t.kind == TrackKind::Audio || matches(t));
        let kept = self.tracks.len();
        debug!(codec, kept, dropped = before - kept, "codec filter");
        Ok(())
    }
}
