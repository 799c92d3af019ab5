//! Error types for device authorization flows.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion, ServerFailure};

use std::time::Duration;

use thiserror::Error;

/// Primary error type for all device-grant operations.
///
/// Also serves as the failure reason of a finished poll loop; see
/// [`DeviceFlowError::reason`] for the stable machine-readable form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceFlowError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error: {0}")]
    Server(ServerFailure),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Authorization denied by user{}", fmt_description(.description))]
    AccessDenied { description: Option<String> },

    #[error("Device code expired, please try again{}", fmt_description(.description))]
    ExpiredToken { description: Option<String> },

    #[error("Timed out after {}s waiting for authorization", .0.as_secs())]
    Timeout(Duration),

    #[error("Authorization cancelled")]
    Cancelled,
}

fn fmt_description(description: &Option<String>) -> String {
    match description {
        Some(text) if !text.is_empty() => format!(": {text}"),
        _ => String::new(),
    }
}

impl DeviceFlowError {
    /// Stable identifier of the failure, suitable for matching and display.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Transport(_) => "transport_error",
            Self::Server(_) => "server_error",
            Self::Decode(_) => "decode_error",
            Self::AccessDenied { .. } => "access_denied",
            Self::ExpiredToken { .. } => "expired_token",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Transport(_) => ErrorCategory::Network,
            Self::Server(failure) if failure.error.is_some() => ErrorCategory::Protocol,
            Self::Server(_) => ErrorCategory::Server,
            Self::Decode(_) => ErrorCategory::Serialization,
            Self::AccessDenied { .. } | Self::ExpiredToken { .. } => ErrorCategory::Authorization,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Whether a caller may reasonably retry the operation that failed.
    ///
    /// The client itself never retries these; the policy belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Server(failure) => failure.error.is_none() && failure.is_server_side(),
            _ => false,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Network => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Server if self.is_retryable() => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Authorization => RecoverySuggestion::RestartFlow,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Cancelled => RecoverySuggestion::None,
            _ => RecoverySuggestion::ContactSupport,
        }
    }

    /// Whether the error ends a poll loop as an authoritative server verdict.
    pub fn is_terminal_grant_state(&self) -> bool {
        matches!(self, Self::AccessDenied { .. } | Self::ExpiredToken { .. })
    }
}

impl From<reqwest::Error> for DeviceFlowError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for DeviceFlowError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DeviceFlowError>;
