//! PTV client error types

use thiserror::Error;

use crate::transport::ResponseMeta;

/// Errors that can occur while building, sending or decoding a PTV request
#[derive(Debug, Error)]
pub enum PtvError {
    /// The relative request path could not be parsed as a URL reference
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// The request body could not be serialized to JSON
    #[error("Body encoding failed: {0}")]
    BodyEncoding(String),

    /// Sending the request or reading the response failed at the network level
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport timeout configured on the client elapsed
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The configured timeout in seconds
        timeout_secs: u64,
    },

    /// The response body was not valid JSON or did not match the expected shape
    #[error("Decode error (HTTP {}): {message}", .meta.status)]
    Decode {
        /// Decoder message
        message: String,
        /// Metadata of the response that failed to decode
        meta: Box<ResponseMeta>,
    },

    /// Reading the response body failed after the status and headers arrived
    #[error("Reading response body failed (HTTP {}): {message}", .meta.status)]
    ResponseBody {
        /// Transport message
        message: String,
        /// Metadata of the response whose body could not be read
        meta: Box<ResponseMeta>,
    },

    /// The caller's sink rejected the response body
    #[error("Writing response body failed (HTTP {}): {message}", .meta.status)]
    Sink {
        /// I/O error message
        message: String,
        /// Metadata of the response being copied
        meta: Box<ResponseMeta>,
    },

    /// Client configuration is invalid
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl PtvError {
    /// Response metadata preserved alongside the error, if a response was received
    #[must_use]
    pub fn response_meta(&self) -> Option<&ResponseMeta> {
        match self {
            Self::Decode { meta, .. }
            | Self::ResponseBody { meta, .. }
            | Self::Sink { meta, .. } => Some(meta),
            _ => None,
        }
    }

    /// Returns true if the network failed, before or during the response
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::ResponseBody { .. }
        )
    }

    /// Returns true if the request failed before any network I/O
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MalformedPath(_) | Self::BodyEncoding(_) | Self::ConfigurationError(_)
        )
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_secs: Option<u64>) -> Self {
        match timeout_secs {
            Some(timeout_secs) if err.is_timeout() => Self::Timeout { timeout_secs },
            _ => Self::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use url::Url;

    use super::*;

    fn meta(status: u16) -> ResponseMeta {
        ResponseMeta {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            url: Url::parse("http://timetableapi.ptv.vic.gov.au/v2/healthcheck").unwrap(),
        }
    }

    #[test]
    fn test_decode_error_keeps_meta() {
        let err = PtvError::Decode {
            message: "expected value".to_string(),
            meta: Box::new(meta(502)),
        };
        assert_eq!(err.response_meta().unwrap().status, StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("502"));
        assert!(!err.is_transport());
        assert!(!err.is_local());
    }

    #[test]
    fn test_transport_errors() {
        assert!(PtvError::Transport("refused".to_string()).is_transport());
        assert!(PtvError::Timeout { timeout_secs: 5 }.is_transport());
        assert!(PtvError::Transport("refused".to_string()).response_meta().is_none());
    }

    #[test]
    fn test_body_errors_keep_meta() {
        let err = PtvError::ResponseBody {
            message: "connection reset".to_string(),
            meta: Box::new(meta(200)),
        };
        assert_eq!(err.response_meta().unwrap().status, StatusCode::OK);
        assert!(err.is_transport());
        assert!(!err.is_local());

        let err = PtvError::Sink {
            message: "disk full".to_string(),
            meta: Box::new(meta(418)),
        };
        assert_eq!(err.response_meta().unwrap().status.as_u16(), 418);
        assert!(err.to_string().contains("disk full"));
        assert!(!err.is_transport());
        assert!(!err.is_local());
    }

    #[test]
    fn test_local_errors() {
        assert!(PtvError::MalformedPath("//x".to_string()).is_local());
        assert!(PtvError::BodyEncoding("bad".to_string()).is_local());
        assert!(PtvError::ConfigurationError("bad".to_string()).is_local());
        assert!(!PtvError::Transport("x".to_string()).is_local());
    }

    #[test]
    fn test_error_display() {
        let err = PtvError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10"));

        let err = PtvError::MalformedPath("http://[::1".to_string());
        assert!(err.to_string().contains("http://[::1"));
    }
}
