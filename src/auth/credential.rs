use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Credential issued once the user authorizes the device.
///
/// Ownership moves to the caller, who decides how (and whether) to persist it.
/// The `Debug` impl never prints token values.
///
/// # Example
/// ```
/// use devicegrant::auth::Credential;
///
/// let credential = Credential::new("access", None, "Bearer", 3600);
/// assert!(credential.is_valid());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: u64,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        token_type: impl Into<String>,
        expires_in: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            token_type: token_type.into(),
            expires_in,
            issued_at: Utc::now(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|delta| self.issued_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at()
    }

    /// Non-empty access token that has not yet expired.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// `Authorization` header value for this credential.
    pub fn authorization_header(&self) -> String {
        let scheme = if self.token_type.is_empty() {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{scheme} {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Identity behind an access token, as reported by the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
