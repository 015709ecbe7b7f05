//! Data source error types.

/// Errors reported by a [`DataSource`](crate::source::DataSource)
/// implementation.
///
/// These are transport-level failures: the request never produced a usable
/// answer. The controller treats them all the same way — the fetch cycle
/// aborts, previously committed state stays intact, and the error is handed
/// back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request failed at the transport level.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("response parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },

    /// The configured base URL is not valid.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl SourceError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a parse error carrying the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if retrying the request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Network(_) => true,
            _ => false,
        }
    }
}
