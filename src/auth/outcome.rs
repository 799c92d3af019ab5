use crate::error::ServerFailure;

use super::Credential;

/// Classified result of a single token-exchange attempt.
///
/// Every server response and every transport failure maps to exactly one
/// variant. Protocol error codes the client does not know land in
/// [`PollOutcome::ServerError`] rather than being treated as retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Success(Credential),
    /// `authorization_pending`: the user has not finished yet.
    Pending,
    /// `slow_down`: the client must widen its polling interval.
    SlowDown,
    /// `access_denied`
    Denied { description: Option<String> },
    /// `expired_token`
    Expired { description: Option<String> },
    TransportError(String),
    ServerError(ServerFailure),
}

impl PollOutcome {
    /// Short label for logs; never includes token material.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Pending => "authorization_pending",
            Self::SlowDown => "slow_down",
            Self::Denied { .. } => "access_denied",
            Self::Expired { .. } => "expired_token",
            Self::TransportError(_) => "transport_error",
            Self::ServerError(_) => "server_error",
        }
    }
}

impl From<reqwest::Error> for PollOutcome {
    fn from(error: reqwest::Error) -> Self {
        Self::TransportError(error.to_string())
    }
}
