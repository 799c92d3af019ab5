//! Error classification, recovery hints, and server failure details.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The user rejected the request or the device code lapsed.
    Authorization,
    Network,
    Timeout,
    Cancelled,
    Server,
    Protocol,
    Configuration,
    Serialization,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    RestartFlow,
    IncreaseTimeout,
    CheckConfiguration,
    ContactSupport,
    None,
}

/// Details of a response the authorization server should not have sent.
///
/// Covers unexpected status codes, unknown protocol `error` codes, and
/// success bodies that do not decode into a credential. The raw body is kept
/// verbatim so callers can surface it for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFailure {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub body: String,
}

impl ServerFailure {
    /// Failure from a status code and raw body with no decodable error code.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            error: None,
            description: None,
            body: body.into(),
        }
    }

    /// Failure carrying a protocol `error` code the client does not handle.
    pub fn protocol(
        status: u16,
        error: impl Into<String>,
        description: Option<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error: Some(error.into()),
            description,
            body: body.into(),
        }
    }

    pub fn is_server_side(&self) -> bool {
        (500..=599).contains(&self.status)
    }
}

impl fmt::Display for ServerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.description) {
            (Some(code), Some(desc)) => write!(f, "status {}: {code}: {desc}", self.status),
            (Some(code), None) => write!(f, "status {}: {code}", self.status),
            _ => write!(f, "unexpected status {}: {}", self.status, self.body),
        }
    }
}
