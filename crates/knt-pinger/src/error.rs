//! Agent error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced by a check endpoint before or after the engine runs.
///
/// Probe failures are not errors: they are the payload of a successful
/// response.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The request body is not valid JSON of the expected shape
    #[error("Malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// The service URL cannot be probed
    #[error("Invalid target URL {url:?}: {reason}")]
    InvalidTarget { url: String, reason: String },

    /// The response could not be serialized
    #[error("Cannot serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl CheckError {
    /// HTTP status reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            CheckError::MalformedBody(_) | CheckError::InvalidTarget { .. } => {
                StatusCode::BAD_REQUEST
            }
            CheckError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("Rejected check request: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Errors discovering the agent's own identity at startup
#[derive(Error, Debug)]
pub enum HostError {
    /// The hostname is not valid UTF-8
    #[error("Cannot resolve hostname: {0:?}")]
    Hostname(std::ffi::OsString),

    /// Network interfaces could not be listed
    #[error("Cannot list network interfaces: {0}")]
    Interfaces(#[from] std::io::Error),

    /// The `/ping` body could not be encoded
    #[error("Cannot serialize hostname-addrs map to JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let malformed = serde_json::from_str::<u32>("{").unwrap_err();
        assert_eq!(
            CheckError::MalformedBody(malformed).status(),
            StatusCode::BAD_REQUEST
        );

        let invalid = CheckError::InvalidTarget {
            url: "::".into(),
            reason: "relative URL without a base".into(),
        };
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
