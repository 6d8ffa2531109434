use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use unimock::unimock;
use url::Url;

use crate::{
    NetResult,
    retry::RetryNet,
    types::{Download, Headers, RangeSpec, RetryPolicy},
};

#[cfg_attr(any(test, feature = "mock"), unimock(api = NetMock))]
#[async_trait]
pub trait Net: Send + Sync {
    /// Downloads `url`, or only `range` of it.
    async fn get(
        &self,
        url: Url,
        range: Option<RangeSpec>,
        headers: Option<Headers>,
    ) -> NetResult<Download>;

    /// Response headers of a HEAD request.
    async fn head(&self, url: Url, headers: Option<Headers>) -> NetResult<Headers>;
}

pub trait NetExt: Net + Sized {
    /// Add retry layer
    fn with_retry(self, policy: RetryPolicy) -> RetryNet<Self> {
        RetryNet::new(self, policy)
    }
}

impl<T: Net> NetExt for T {}
