use thiserror::Error;

/// Transport failures. Cloneable so a retry layer can keep the last one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("timeout")]
    Timeout,
    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },
    #[error("invalid byte range: {0}")]
    InvalidRange(String),
    #[error("response for {url} has no usable {header} header")]
    MissingHeader { header: &'static str, url: String },
    #[error("request failed after {max_retries} retries: {source}")]
    RetryExhausted {
        max_retries: u32,
        source: Box<NetError>,
    },
}

impl NetError {
    pub fn http<S: Into<String>>(message: S) -> Self {
        Self::Http(message.into())
    }

    #[must_use]
    pub fn http_status(status: u16, url: &url::Url) -> Self {
        Self::HttpStatus {
            status,
            url: url.to_string(),
        }
    }

    /// Connection, timeout, 5xx, 408 and 429 failures are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Self::Http(message) => {
                let message = message.to_ascii_lowercase();
                message.contains("connection") || message.contains("timed out")
            }
            Self::InvalidRange(_) | Self::MissingHeader { .. } | Self::RetryExhausted { .. } => {
                false
            }
        }
    }

    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::RetryExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if let (Some(status), Some(url)) = (error.status(), error.url()) {
            Self::http_status(status.as_u16(), url)
        } else {
            Self::Http(error.to_string())
        }
    }
}

pub type NetResult<T> = Result<T, NetError>;
