use thiserror::Error;

/// Everything that can go wrong talking to a downstream source.
///
/// The engine stores the `Display` rendering of these in the composite's
/// errors map; only the address resolver propagates them as hard failures.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source's endpoint URL or required credentials are absent from
    /// configuration. The adapter returns its empty value with no error
    /// recorded.
    #[error("source disabled by configuration")]
    ConfigMissing,

    /// Network or TLS failure from the underlying HTTP client.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A non-2xx status outside the specially-mapped ones.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Semantic 404: the upstream has no data for this point or identifier.
    #[error("no data at {url}")]
    NotFound { url: String },

    /// The response body did not match the expected shape. Also covers
    /// non-JSON payload fragments such as WKT coordinate strings.
    #[error("decode error for {context}: {reason}")]
    Decode { context: String, reason: String },

    /// The shared deadline fired while the operation was in flight.
    #[error("deadline exceeded")]
    Timeout,

    /// The deadline had already passed before the next attempt or sleep.
    #[error("cancelled")]
    Cancelled,

    /// 401/403 from the upstream.
    #[error("unauthorised by {url}")]
    Unauthorised { url: String },

    /// 429 from the upstream.
    #[error("rate limited by {url}")]
    RateLimited { url: String },
}

impl SourceError {
    /// Classifies a `reqwest` failure: client-side timeouts count as
    /// [`SourceError::Timeout`], everything else is transport.
    #[must_use]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::Transport(err)
        }
    }

    /// Returns `true` for errors worth another attempt after back-off:
    /// network failures, 5xx, and upstream rate limiting. Decode errors,
    /// auth failures, 404s, disabled sources, and anything deadline-related
    /// are returned immediately.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            SourceError::Transport(_) | SourceError::RateLimited { .. } => true,
            SourceError::Status { status, .. } => *status >= 500,
            SourceError::ConfigMissing
            | SourceError::NotFound { .. }
            | SourceError::Decode { .. }
            | SourceError::Timeout
            | SourceError::Cancelled
            | SourceError::Unauthorised { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retriable() {
        assert!(SourceError::Status {
            status: 503,
            url: "http://x".to_owned()
        }
        .is_retriable());
        assert!(SourceError::RateLimited {
            url: "http://x".to_owned()
        }
        .is_retriable());
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!SourceError::Status {
            status: 400,
            url: "http://x".to_owned()
        }
        .is_retriable());
        assert!(!SourceError::NotFound {
            url: "http://x".to_owned()
        }
        .is_retriable());
        assert!(!SourceError::Unauthorised {
            url: "http://x".to_owned()
        }
        .is_retriable());
        assert!(!SourceError::ConfigMissing.is_retriable());
        assert!(!SourceError::Timeout.is_retriable());
        assert!(!SourceError::Cancelled.is_retriable());
    }

    #[test]
    fn decode_errors_are_not_retriable() {
        let err = SourceError::Decode {
            context: "test".to_owned(),
            reason: "expected value".to_owned(),
        };
        assert!(!err.is_retriable());
    }
}
