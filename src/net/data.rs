use serde::Deserialize;

use crate::ArcStr;

/// Failure of a request to the backend: network unreachable, timeout, non-2xx
/// response or an undecodable body.
///
/// Carries the backend's `{code, message}` pair so it can be shown or logged
/// as is, plus the HTTP status when there was a response at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    pub code: ArcStr,
    pub message: ArcStr,
    pub status: Option<u16>,
}

/// Body of a non-2xx backend response: `{"error": {"code": .., "message": ..}}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Debug, Deserialize)]
struct ErrorInfo {
    code: String,
    message: String,
}

impl TransportError {
    pub const NETWORK: &'static str = "network_error";
    pub const HTTP: &'static str = "http_error";
    pub const DECODE: &'static str = "decode_error";

    pub fn new(code: impl Into<ArcStr>, message: impl Into<ArcStr>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    /// The request never produced a response.
    pub fn network(message: impl Into<ArcStr>) -> Self {
        Self::new(Self::NETWORK, message)
    }

    pub fn timeout() -> Self {
        Self::network("Request timed out - server may be down")
    }

    /// A response body that could not be decoded.
    pub fn decode(message: impl Into<ArcStr>) -> Self {
        Self::new(Self::DECODE, message)
    }

    /// Builds the error for a non-2xx response. The backend's own error code
    /// is used when the body carries one, `http_error` otherwise.
    pub fn from_response(status: u16, body: &str) -> Self {
        let mut error = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error }) => Self::new(error.code, error.message),
            Err(_) if body.trim().is_empty() => Self::new(Self::HTTP, format!("HTTP {status}")),
            Err(_) => Self::new(Self::HTTP, body.trim()),
        };
        error.status = Some(status);
        error
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout()
        } else if error.is_connect() {
            Self::network("Cannot connect to server")
        } else if error.is_decode() || error.is_body() {
            Self::decode(error.to_string())
        } else {
            Self::network("Network request failed")
        }
    }
}
