use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Version};
use tokio::time::Instant;
use tracing::trace;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::{Download, Headers, NetOptions, RangeSpec},
};

#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError::Http`] when the TLS backend cannot be initialised.
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .user_agent(options.user_agent.clone())
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| NetError::http(format!("building HTTP client: {e}")))?;
        Ok(Self { inner, options })
    }

    #[must_use]
    pub fn options(&self) -> &NetOptions {
        &self.options
    }

    fn apply_headers(
        mut req: reqwest::RequestBuilder,
        headers: Option<Headers>,
    ) -> reqwest::RequestBuilder {
        if let Some(headers) = headers {
            for (k, v) in headers.iter() {
                req = req.header(k, v);
            }
        }
        req
    }

    fn check_status(resp: &Response, url: &Url, ranged: bool) -> NetResult<()> {
        let status = resp.status();
        if status.is_success() || (ranged && status == StatusCode::PARTIAL_CONTENT) {
            Ok(())
        } else {
            Err(NetError::http_status(status.as_u16(), url))
        }
    }

    fn protocol_label(version: Version) -> String {
        match version {
            Version::HTTP_09 => "HTTP/0.9",
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_2 => "HTTP/2",
            Version::HTTP_3 => "HTTP/3",
            _ => "HTTP/1.1",
        }
        .to_string()
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn get(
        &self,
        url: Url,
        range: Option<RangeSpec>,
        headers: Option<Headers>,
    ) -> NetResult<Download> {
        let mut req = self.inner.get(url.clone());
        if let Some(range) = &range {
            req = req.header(reqwest::header::RANGE, range.to_header_value());
        }
        let req = Self::apply_headers(req, headers);

        let started = Instant::now();
        let resp = req.send().await?;
        let rtt = started.elapsed();
        Self::check_status(&resp, &url, range.is_some())?;

        let protocol = Self::protocol_label(resp.version());
        let body = resp.bytes().await?;
        trace!(%url, bytes = body.len(), ?rtt, %protocol, "GET complete");

        Ok(Download {
            body,
            rtt,
            protocol,
        })
    }

    async fn head(&self, url: Url, headers: Option<Headers>) -> NetResult<Headers> {
        let req = Self::apply_headers(self.inner.head(url.clone()), headers);

        let resp = req.send().await?;
        Self::check_status(&resp, &url, false)?;

        let mut out = Headers::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                out.insert(name.as_str(), v);
            }
        }

        Ok(out)
    }
}
