use std::future::Future;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::warn;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::{Download, Headers, RangeSpec, RetryPolicy},
};

/// Retry decorator for Net implementations.
///
/// Retryable failures are attempted again after the policy delay; once
/// `max_retries` retries have failed the last error is wrapped in
/// [`NetError::RetryExhausted`]. Non-retryable errors surface immediately.
pub struct RetryNet<N> {
    inner: N,
    policy: RetryPolicy,
}

impl<N: Net> RetryNet<N> {
    pub fn new(inner: N, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    async fn run<'a, T, F, Fut>(&'a self, operation: &str, url: &Url, mut call: F) -> NetResult<T>
    where
        F: FnMut(&'a N) -> Fut,
        Fut: Future<Output = NetResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match call(&self.inner).await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) if !self.policy.should_retry(&error, attempt) => {
                    return Err(NetError::RetryExhausted {
                        max_retries: self.policy.max_retries,
                        source: Box::new(error),
                    });
                }
                Err(error) => {
                    attempt += 1;
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        %url,
                        attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "request failed, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl<N: Net> Net for RetryNet<N> {
    async fn get(
        &self,
        url: Url,
        range: Option<RangeSpec>,
        headers: Option<Headers>,
    ) -> NetResult<Download> {
        self.run("get", &url, |net| {
            net.get(url.clone(), range.clone(), headers.clone())
        })
        .await
    }

    async fn head(&self, url: Url, headers: Option<Headers>) -> NetResult<Headers> {
        self.run("head", &url, |net| net.head(url.clone(), headers.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use rstest::rstest;
    use tokio::time::Instant;
    use unimock::{MockFn, Unimock, matching};

    use super::*;
    use crate::traits::NetMock;

    fn download(body: &'static str) -> Download {
        Download {
            body: Bytes::from_static(body.as_bytes()),
            rtt: Duration::from_millis(5),
            protocol: "HTTP/1.1".to_string(),
        }
    }

    fn url() -> Url {
        Url::parse("http://test.com/seg_1.m4s").unwrap()
    }

    #[rstest]
    #[tokio::test]
    async fn success_on_first_try_does_not_wait() {
        let mock = Unimock::new(
            NetMock::get
                .some_call(matching!(_, _, _))
                .returns(Ok(download("segment"))),
        );
        let net = RetryNet::new(mock, RetryPolicy::default());

        let result = net.get(url(), None, None).await.unwrap();

        assert_eq!(result.body, Bytes::from_static(b"segment"));
    }

    #[tokio::test(start_paused = true)]
    async fn connection_failures_wait_one_second_between_attempts() {
        let mock = Unimock::new((
            NetMock::get
                .next_call(matching!(_, _, _))
                .returns(Err(NetError::Connect("refused".into()))),
            NetMock::get
                .next_call(matching!(_, _, _))
                .returns(Err(NetError::Connect("refused".into()))),
            NetMock::get
                .next_call(matching!(_, _, _))
                .returns(Ok(download("late"))),
        ));
        let net = RetryNet::new(mock, RetryPolicy::default());
        let started = Instant::now();

        let result = net.get(url(), None, None).await;

        assert!(result.is_ok());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_the_last_error() {
        let mock = Unimock::new(
            NetMock::get
                .each_call(matching!(_, _, _))
                .returns(Err(NetError::Timeout)),
        );
        let net = RetryNet::new(mock, RetryPolicy::default());
        let started = Instant::now();

        let result = net.get(url(), None, None).await;

        assert_eq!(
            result,
            Err(NetError::RetryExhausted {
                max_retries: 5,
                source: Box::new(NetError::Timeout),
            })
        );
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[rstest]
    #[tokio::test]
    async fn non_retryable_error_surfaces_immediately() {
        let error = NetError::HttpStatus {
            status: 404,
            url: url().to_string(),
        };
        let mock = Unimock::new(
            NetMock::get
                .some_call(matching!(_, _, _))
                .returns(Err(error.clone())),
        );
        let net = RetryNet::new(mock, RetryPolicy::default());

        assert_eq!(net.get(url(), None, None).await, Err(error));
    }

    #[tokio::test(start_paused = true)]
    async fn head_is_retried_like_get() {
        let mut headers = Headers::new();
        headers.insert("Content-Length", "42");
        let mock = Unimock::new((
            NetMock::head
                .next_call(matching!(_, _))
                .returns(Err(NetError::HttpStatus {
                    status: 503,
                    url: url().to_string(),
                })),
            NetMock::head
                .next_call(matching!(_, _))
                .returns(Ok(headers)),
        ));
        let net = RetryNet::new(mock, RetryPolicy::default());

        let result = net.head(url(), None).await.unwrap();

        assert_eq!(result.content_length(), Some(42));
    }

    #[tokio::test]
    async fn zero_retries_fails_after_one_attempt() {
        let mock = Unimock::new(
            NetMock::head
                .some_call(matching!(_, _))
                .returns(Err(NetError::Timeout)),
        );
        let net = RetryNet::new(mock, RetryPolicy::new(0, Duration::ZERO, Duration::ZERO));

        assert!(matches!(
            net.head(url(), None).await,
            Err(NetError::RetryExhausted { max_retries: 0, .. })
        ));
    }
}
