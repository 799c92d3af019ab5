use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Interval used when the server omits `interval` or sends zero.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Device-authorization session returned by the initiating request.
///
/// Read-only once created. A UI routine may hold a clone to render the user
/// code while the poller runs. The `Debug` impl redacts `device_code`.
///
/// # Example
/// ```
/// use devicegrant::auth::DeviceSession;
///
/// let session = DeviceSession::new(
///     "device-code",
///     "ABCD-1234",
///     "https://auth.example/device",
///     None,
///     Some(600),
///     None,
/// );
/// assert_eq!(session.interval_secs(), 5);
/// assert_eq!(session.user_code(), "ABCD-1234");
/// ```
#[derive(Clone)]
pub struct DeviceSession {
    device_code: String,
    user_code: String,
    verification_uri: String,
    verification_uri_complete: Option<String>,
    expires_in: Option<u64>,
    expires_at: Option<DateTime<Utc>>,
    interval_secs: u64,
}

impl DeviceSession {
    /// Build a session, normalizing the poll interval and stamping expiry.
    pub fn new(
        device_code: impl Into<String>,
        user_code: impl Into<String>,
        verification_uri: impl Into<String>,
        verification_uri_complete: Option<String>,
        expires_in: Option<u64>,
        interval: Option<u64>,
    ) -> Self {
        let expires_at = expires_in
            .filter(|secs| *secs > 0)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        Self {
            device_code: device_code.into(),
            user_code: user_code.into(),
            verification_uri: verification_uri.into(),
            verification_uri_complete: verification_uri_complete.filter(|uri| !uri.is_empty()),
            expires_in,
            expires_at,
            interval_secs: normalize_interval(interval),
        }
    }

    /// Secret presented on every token request. Never display or log it.
    pub fn device_code(&self) -> &str {
        &self.device_code
    }

    pub fn user_code(&self) -> &str {
        &self.user_code
    }

    pub fn verification_uri(&self) -> &str {
        &self.verification_uri
    }

    pub fn verification_uri_complete(&self) -> Option<&str> {
        self.verification_uri_complete.as_deref()
    }

    /// Lifetime in seconds as announced by the server.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// URI to show or open: the pre-filled one when the server sent it.
    pub fn display_uri(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }

    /// Time left before the device code lapses, if the server announced it.
    pub fn remaining(&self) -> Option<Duration> {
        let expires_at = self.expires_at?;
        Some((expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device_code", &"[redacted]")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("interval_secs", &self.interval_secs)
            .finish()
    }
}

/// Zero or missing means "not specified".
fn normalize_interval(interval: Option<u64>) -> u64 {
    match interval {
        Some(secs) if secs > 0 => secs,
        _ => DEFAULT_POLL_INTERVAL_SECS,
    }
}
