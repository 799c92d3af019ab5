//! Wire payloads for the device and token endpoints, and their decoding.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::error::{DeviceFlowError, ServerFailure};

use super::{Credential, DeviceSession, PollOutcome};

/// `grant_type` value for the device-code token exchange.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

#[derive(Debug, Serialize)]
pub(crate) struct DeviceCodeRequest<'a> {
    pub client_id: &'a str,
    pub scope: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub grant_type: &'static str,
    pub device_code: &'a str,
    pub client_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    token_type: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Protocol error codes returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TokenErrorCode {
    AuthorizationPending,
    SlowDown,
    AccessDenied,
    ExpiredToken,
    /// Any code the client has no dedicated transition for.
    #[strum(default)]
    Other(String),
}

impl TokenErrorCode {
    pub fn parse(code: &str) -> Self {
        match Self::from_str(code) {
            Ok(parsed) => parsed,
            Err(_) => Self::Other(code.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthorizationPending => "authorization_pending",
            Self::SlowDown => "slow_down",
            Self::AccessDenied => "access_denied",
            Self::ExpiredToken => "expired_token",
            Self::Other(code) => code,
        }
    }
}

/// Decode the device-authorization response into a session.
pub fn decode_device_session(status: u16, body: &str) -> Result<DeviceSession, DeviceFlowError> {
    if !(200..300).contains(&status) {
        return Err(DeviceFlowError::Server(ServerFailure::status(status, body)));
    }
    let payload: DeviceCodeResponse = serde_json::from_str(body)?;
    for (field, value) in [
        ("device_code", &payload.device_code),
        ("user_code", &payload.user_code),
        ("verification_uri", &payload.verification_uri),
    ] {
        if value.is_empty() {
            return Err(DeviceFlowError::Decode(format!("{field} is empty")));
        }
    }
    Ok(DeviceSession::new(
        payload.device_code,
        payload.user_code,
        payload.verification_uri,
        payload.verification_uri_complete,
        payload.expires_in,
        payload.interval,
    ))
}

/// Classify one token-endpoint response.
///
/// An `error` member wins over the status code, since some servers report
/// protocol errors with 200.
pub fn classify_token_response(status: u16, body: &str) -> PollOutcome {
    if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(body) {
        if !err.error.is_empty() {
            let description = err.error_description.filter(|d| !d.is_empty());
            return match TokenErrorCode::parse(&err.error) {
                TokenErrorCode::AuthorizationPending => PollOutcome::Pending,
                TokenErrorCode::SlowDown => PollOutcome::SlowDown,
                TokenErrorCode::AccessDenied => PollOutcome::Denied { description },
                TokenErrorCode::ExpiredToken => PollOutcome::Expired { description },
                TokenErrorCode::Other(code) => PollOutcome::ServerError(ServerFailure::protocol(
                    status,
                    code,
                    description,
                    body,
                )),
            };
        }
    }

    if status != 200 {
        return PollOutcome::ServerError(ServerFailure::status(status, body));
    }

    match serde_json::from_str::<TokenResponse>(body) {
        Ok(token) if !token.access_token.is_empty() && !token.token_type.is_empty() => {
            PollOutcome::Success(Credential::new(
                token.access_token,
                token.refresh_token,
                token.token_type,
                token.expires_in,
            ))
        }
        // Missing token_type or expires_in is a malformed success body.
        _ => PollOutcome::ServerError(ServerFailure::status(status, body)),
    }
}
