use std::{collections::HashMap, time::Duration};

use dashemu_abr::{AbrError, AbrResult, SegmentSizeProbe};
use dashemu_net::{Net, NetError, RangeSpec};
use tokio::sync::Mutex;
use tracing::trace;
use url::Url;

use crate::{PlayerResult, manifest::Manifest};

/// Where the bytes of one segment live.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SegmentRequest {
    pub url: Url,
    pub range: Option<RangeSpec>,
}

impl SegmentRequest {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { url, range: None }
    }

    #[must_use]
    pub fn ranged(url: Url, range: RangeSpec) -> Self {
        Self {
            url,
            range: Some(range),
        }
    }

    /// Same bytes, served from `url`.
    #[must_use]
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            url,
            range: self.range.clone(),
        }
    }
}

/// Result of a completed segment download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedSegment {
    pub size: u64,
    pub rtt: Duration,
    pub protocol: String,
}

/// Fetch collaborator of the playback loop.
///
/// Transient failures are absorbed below this trait; an error returned here
/// ends the session.
#[expect(async_fn_in_trait)]
#[cfg_attr(test, unimock::unimock(api = SegmentFetcherMock))]
pub trait SegmentFetcher {
    /// Downloads the segment.
    async fn fetch(&self, request: &SegmentRequest) -> PlayerResult<FetchedSegment>;

    /// Size of the segment in bytes without downloading it.
    async fn content_length(&self, request: &SegmentRequest) -> PlayerResult<u64>;
}

/// [`SegmentFetcher`] over a [`Net`] transport.
///
/// Sizes learned from downloads and HEAD probes are cached per request, so
/// lookahead strategies probe each upcoming segment once.
pub struct HttpSegmentFetcher<N> {
    net: N,
    sizes: Mutex<HashMap<SegmentRequest, u64>>,
}

impl<N: Net> HttpSegmentFetcher<N> {
    pub fn new(net: N) -> Self {
        Self {
            net,
            sizes: Mutex::new(HashMap::new()),
        }
    }

    pub fn net(&self) -> &N {
        &self.net
    }
}

impl<N: Net> SegmentFetcher for HttpSegmentFetcher<N> {
    async fn fetch(&self, request: &SegmentRequest) -> PlayerResult<FetchedSegment> {
        let download = self
            .net
            .get(request.url.clone(), request.range.clone(), None)
            .await?;
        let size = download.body.len() as u64;
        self.sizes.lock().await.insert(request.clone(), size);
        Ok(FetchedSegment {
            size,
            rtt: download.rtt,
            protocol: download.protocol,
        })
    }

    async fn content_length(&self, request: &SegmentRequest) -> PlayerResult<u64> {
        if let Some(len) = request.range.as_ref().and_then(RangeSpec::len) {
            return Ok(len);
        }
        if let Some(&size) = self.sizes.lock().await.get(request) {
            return Ok(size);
        }

        let headers = self.net.head(request.url.clone(), None).await?;
        let size = headers
            .content_length()
            .ok_or_else(|| NetError::MissingHeader {
                header: "content-length",
                url: request.url.to_string(),
            })?;
        trace!(url = %request.url, size, "segment size probed");
        self.sizes.lock().await.insert(request.clone(), size);
        Ok(size)
    }
}

/// Probes upcoming segment sizes of one track for lookahead strategies.
pub(crate) struct TrackProbe<'a, F> {
    pub(crate) fetcher: &'a F,
    pub(crate) manifest: &'a Manifest,
    pub(crate) track: usize,
}

impl<F: SegmentFetcher> SegmentSizeProbe for TrackProbe<'_, F> {
    async fn segment_size(&self, rendition: usize, segment: u64) -> AbrResult<u64> {
        let request = self
            .manifest
            .segment_request(self.track, rendition, segment)
            .map_err(AbrError::probe)?;
        self.fetcher
            .content_length(&request)
            .await
            .map_err(AbrError::probe)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use dashemu_abr::Rendition;
    use dashemu_net::{Download, Headers, mock::NetMock};
    use unimock::{MockFn, Unimock, matching};

    use super::*;
    use crate::{
        PlayerError,
        manifest::{SegmentSource, TrackKind, TrackManifest},
    };

    fn request(path: &str) -> SegmentRequest {
        SegmentRequest::new(Url::parse("http://cdn.test/").unwrap().join(path).unwrap())
    }

    fn headers(length: &str) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Length", length);
        headers
    }

    #[tokio::test]
    async fn fetch_reports_body_size_and_protocol() {
        let net = Unimock::new(NetMock::get.some_call(matching!(_, _, _)).returns(Ok(
            Download {
                body: Bytes::from(vec![0_u8; 1500]),
                rtt: Duration::from_millis(12),
                protocol: "HTTP/2.0".into(),
            },
        )));
        let fetcher = HttpSegmentFetcher::new(net);

        let fetched = fetcher.fetch(&request("seg_1.m4s")).await.unwrap();

        assert_eq!(
            fetched,
            FetchedSegment {
                size: 1500,
                rtt: Duration::from_millis(12),
                protocol: "HTTP/2.0".into(),
            }
        );
    }

    #[tokio::test]
    async fn head_probe_is_cached() {
        let net = Unimock::new(
            NetMock::head
                .next_call(matching!((url, _) if url.path() == "/seg_2.m4s"))
                .returns(Ok(headers("4096"))),
        );
        let fetcher = HttpSegmentFetcher::new(net);
        let request = request("seg_2.m4s");

        assert_eq!(fetcher.content_length(&request).await.unwrap(), 4096);
        assert_eq!(fetcher.content_length(&request).await.unwrap(), 4096);
    }

    #[tokio::test]
    async fn downloaded_size_answers_later_probes() {
        let net = Unimock::new(NetMock::get.next_call(matching!(_, _, _)).returns(Ok(
            Download {
                body: Bytes::from_static(b"0123456789"),
                rtt: Duration::ZERO,
                protocol: "HTTP/1.1".into(),
            },
        )));
        let fetcher = HttpSegmentFetcher::new(net);
        let request = request("seg_3.m4s");

        fetcher.fetch(&request).await.unwrap();

        assert_eq!(fetcher.content_length(&request).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn closed_range_needs_no_request() {
        let fetcher = HttpSegmentFetcher::new(Unimock::new(()));
        let request = SegmentRequest::ranged(
            Url::parse("http://cdn.test/video.mp4").unwrap(),
            RangeSpec::new(1000, Some(2999)),
        );

        assert_eq!(fetcher.content_length(&request).await.unwrap(), 2000);
    }

    #[tokio::test]
    async fn missing_content_length_is_an_error() {
        let net = Unimock::new(
            NetMock::head
                .some_call(matching!(_, _))
                .returns(Ok(Headers::new())),
        );
        let fetcher = HttpSegmentFetcher::new(net);

        let result = fetcher.content_length(&request("seg_4.m4s")).await;

        assert!(matches!(
            result,
            Err(PlayerError::Net(NetError::MissingHeader { header: "content-length", .. }))
        ));
    }

    fn manifest() -> Manifest {
        let track = TrackManifest::new(
            TrackKind::Video,
            "video/mp4",
            vec![
                (
                    Rendition::with_bandwidth(2_000_000),
                    SegmentSource::template("hi_$Number$.m4s"),
                ),
                (
                    Rendition::with_bandwidth(500_000),
                    SegmentSource::template("lo_$Number$.m4s"),
                ),
            ],
        )
        .unwrap();
        Manifest::new(Url::parse("http://cdn.test/").unwrap(), 2000, 20_000, vec![track]).unwrap()
    }

    #[tokio::test]
    async fn track_probe_resolves_segment_urls() {
        let fetcher = Unimock::new(
            SegmentFetcherMock::content_length
                .each_call(matching!(_))
                .answers(&|_, request| {
                    Ok(if request.url.path().starts_with("/hi_") {
                        500_000
                    } else {
                        125_000
                    })
                }),
        );
        let manifest = manifest();
        let probe = TrackProbe {
            fetcher: &fetcher,
            manifest: &manifest,
            track: 0,
        };

        assert_eq!(probe.segment_size(0, 3).await.unwrap(), 500_000);
        assert_eq!(probe.segment_size(1, 3).await.unwrap(), 125_000);
    }

    #[tokio::test]
    async fn track_probe_wraps_fetch_failures() {
        let fetcher = Unimock::new(
            SegmentFetcherMock::content_length
                .some_call(matching!(_))
                .answers(&|_, _| Err(PlayerError::Net(NetError::Timeout))),
        );
        let manifest = manifest();
        let probe = TrackProbe {
            fetcher: &fetcher,
            manifest: &manifest,
            track: 0,
        };

        assert!(matches!(
            probe.segment_size(0, 1).await,
            Err(AbrError::Probe(_))
        ));
        assert!(matches!(
            probe.segment_size(5, 1).await,
            Err(AbrError::Probe(_))
        ));
    }
}
