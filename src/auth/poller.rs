//! Token polling loop for the device-code grant.
//!
//! The loop is split in two: [`PollState::advance`] is the pure transition
//! function, and [`Poller`] drives it against an injected [`TokenExchange`]
//! and [`Sleeper`] under a deadline and a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DeviceFlowError, Result};

use super::{Credential, DeviceSession, PollOutcome};

/// Floor for the poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Increase applied on each `slow_down` response.
pub const DEFAULT_SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Stand-in deadline when `now + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// How the poll interval reacts to `slow_down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    pub slow_down_step: Duration,
    /// Optional ceiling. `None` lets repeated `slow_down` grow the interval without bound.
    pub max_interval: Option<Duration>,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            slow_down_step: DEFAULT_SLOW_DOWN_STEP,
            max_interval: None,
        }
    }
}

impl IntervalPolicy {
    pub fn with_max_interval(mut self, max: Duration) -> Self {
        self.max_interval = Some(max);
        self
    }

    /// Interval to use after a `slow_down`. Never smaller than `current`.
    pub fn after_slow_down(&self, current: Duration) -> Duration {
        let next = current.saturating_add(self.slow_down_step);
        match self.max_interval {
            Some(max) => next.min(max.max(current)),
            None => next,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.slow_down_step.is_zero() {
            return Err(DeviceFlowError::Configuration(
                "slow_down step must be positive".to_string(),
            ));
        }
        if self.max_interval.is_some_and(|max| max < MIN_POLL_INTERVAL) {
            return Err(DeviceFlowError::Configuration(
                "max interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// State of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Polling { interval: Duration },
    Succeeded(Credential),
    Failed(DeviceFlowError),
}

impl PollState {
    pub fn start(session: &DeviceSession) -> Self {
        Self::Polling {
            interval: session.interval().max(MIN_POLL_INTERVAL),
        }
    }

    /// Apply one classified outcome. Terminal states absorb every outcome.
    pub fn advance(self, outcome: PollOutcome, policy: &IntervalPolicy) -> Self {
        let interval = match self {
            Self::Polling { interval } => interval,
            terminal => return terminal,
        };
        match outcome {
            PollOutcome::Success(credential) => Self::Succeeded(credential),
            PollOutcome::Pending => Self::Polling { interval },
            PollOutcome::SlowDown => Self::Polling {
                interval: policy.after_slow_down(interval),
            },
            PollOutcome::Denied { description } => {
                Self::Failed(DeviceFlowError::AccessDenied { description })
            }
            PollOutcome::Expired { description } => {
                Self::Failed(DeviceFlowError::ExpiredToken { description })
            }
            PollOutcome::TransportError(detail) => Self::Failed(DeviceFlowError::Transport(detail)),
            PollOutcome::ServerError(failure) => Self::Failed(DeviceFlowError::Server(failure)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling { .. })
    }

    /// Current interval while polling.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Polling { interval } => Some(*interval),
            _ => None,
        }
    }
}

/// One token-exchange request against the authorization server.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, device_code: &str) -> PollOutcome;
}

/// Wait between ticks.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drives the poll state machine until a terminal state, timeout, or cancellation.
///
/// At most one token request is outstanding at any time. Each tick waits the
/// current interval first, then issues one request.
pub struct Poller {
    exchange: Arc<dyn TokenExchange>,
    sleeper: Arc<dyn Sleeper>,
    policy: IntervalPolicy,
}

impl Poller {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            sleeper: Arc::new(TokioSleeper),
            policy: IntervalPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_interval_policy(mut self, policy: IntervalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn interval_policy(&self) -> &IntervalPolicy {
        &self.policy
    }

    /// Poll until the grant resolves or `timeout` elapses.
    pub async fn poll(&self, session: &DeviceSession, timeout: Duration) -> Result<Credential> {
        self.poll_until_cancelled(session, timeout, &CancellationToken::new())
            .await
    }

    /// Like [`Poller::poll`], but also stops as soon as `cancel` fires.
    ///
    /// Cancellation, the overall deadline, and the session's own expiry all
    /// interrupt the inter-tick wait and any in-flight request immediately.
    /// No request is issued after any of them fires.
    pub async fn poll_until_cancelled(
        &self,
        session: &DeviceSession,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Credential> {
        let started = Instant::now();
        let (deadline, lapses_first) = match session.remaining() {
            Some(remaining) if remaining < timeout => (deadline_after(started, remaining), true),
            _ => (deadline_after(started, timeout), false),
        };

        let mut state = PollState::start(session);
        let mut attempts: u32 = 0;
        info!(
            interval_secs = session.interval_secs(),
            timeout_secs = timeout.as_secs(),
            "waiting for device authorization"
        );

        loop {
            let interval = match state {
                PollState::Polling { interval } => interval,
                PollState::Succeeded(credential) => {
                    info!(attempts, "device authorization granted");
                    return Ok(credential);
                }
                PollState::Failed(error) => {
                    warn!(attempts, reason = error.reason(), error = %error, "device authorization failed");
                    return Err(error);
                }
            };

            if cancel.is_cancelled() {
                return Err(DeviceFlowError::Cancelled);
            }

            let tick = async {
                self.sleeper.sleep(interval).await;
                self.exchange.exchange(session.device_code()).await
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempts, "device authorization polling cancelled");
                    return Err(DeviceFlowError::Cancelled);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    if lapses_first {
                        warn!(attempts, "device code lapsed before authorization");
                        return Err(DeviceFlowError::ExpiredToken { description: None });
                    }
                    warn!(attempts, timeout_secs = timeout.as_secs(), "device authorization timed out");
                    return Err(DeviceFlowError::Timeout(timeout));
                }
                outcome = tick => outcome,
            };

            attempts += 1;
            debug!(
                attempt = attempts,
                outcome = outcome.label(),
                interval_secs = interval.as_secs(),
                "token poll attempt"
            );
            state = state.advance(outcome, &self.policy);
            if let Some(next) = state.interval() {
                if next != interval {
                    info!(interval_secs = next.as_secs(), "server asked to slow down");
                }
            }
        }
    }
}

/// `start + wait`, saturating to a far-future instant instead of overflowing.
fn deadline_after(start: Instant, wait: Duration) -> Instant {
    start
        .checked_add(wait)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerFailure;
    use pretty_assertions::assert_eq;

    fn polling(secs: u64) -> PollState {
        PollState::Polling {
            interval: Duration::from_secs(secs),
        }
    }

    #[test]
    fn pending_keeps_interval() {
        let next = polling(5).advance(PollOutcome::Pending, &IntervalPolicy::default());
        assert_eq!(next, polling(5));
    }

    #[test]
    fn slow_down_is_cumulative() {
        let policy = IntervalPolicy::default();
        let state = polling(5)
            .advance(PollOutcome::SlowDown, &policy)
            .advance(PollOutcome::Pending, &policy)
            .advance(PollOutcome::SlowDown, &policy);
        assert_eq!(state, polling(15));
    }

    #[test]
    fn slow_down_respects_configured_ceiling() {
        let policy = IntervalPolicy::default().with_max_interval(Duration::from_secs(12));
        let state = polling(5)
            .advance(PollOutcome::SlowDown, &policy)
            .advance(PollOutcome::SlowDown, &policy);
        assert_eq!(state, polling(12));

        // Never shrinks an interval already above the ceiling.
        let state = polling(20).advance(PollOutcome::SlowDown, &policy);
        assert_eq!(state, polling(20));
    }

    #[test]
    fn denial_and_expiry_are_terminal() {
        let policy = IntervalPolicy::default();
        let denied = polling(5).advance(
            PollOutcome::Denied {
                description: Some("nope".into()),
            },
            &policy,
        );
        assert_eq!(
            denied,
            PollState::Failed(DeviceFlowError::AccessDenied {
                description: Some("nope".into())
            })
        );
        assert!(denied.is_terminal());

        let expired = polling(5).advance(PollOutcome::Expired { description: None }, &policy);
        assert_eq!(expired.interval(), None);
        match expired {
            PollState::Failed(err) => assert_eq!(err.reason(), "expired_token"),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn transport_and_server_errors_fail_with_detail() {
        let policy = IntervalPolicy::default();
        let state = polling(5).advance(PollOutcome::TransportError("refused".into()), &policy);
        assert_eq!(
            state,
            PollState::Failed(DeviceFlowError::Transport("refused".into()))
        );

        let failure = ServerFailure::protocol(400, "invalid_grant", None, "{}");
        let state = polling(5).advance(PollOutcome::ServerError(failure.clone()), &policy);
        assert_eq!(state, PollState::Failed(DeviceFlowError::Server(failure)));
    }

    #[test]
    fn terminal_states_absorb_further_outcomes() {
        let policy = IntervalPolicy::default();
        let failed = PollState::Failed(DeviceFlowError::Cancelled);
        assert_eq!(
            failed.clone().advance(PollOutcome::Pending, &policy),
            failed
        );
    }

    #[test]
    fn start_uses_session_interval() {
        let session = DeviceSession::new("D1", "U1", "https://a/device", None, None, Some(3));
        assert_eq!(PollState::start(&session), polling(3));
    }

    #[tokio::test]
    async fn deadline_saturates_instead_of_overflowing() {
        let start = Instant::now();
        assert_eq!(
            deadline_after(start, Duration::from_secs(12)),
            start + Duration::from_secs(12)
        );
        assert!(deadline_after(start, Duration::MAX) > start);
        assert!(deadline_after(start, Duration::from_secs(u64::MAX)) > start);
    }

    #[test]
    fn zero_step_is_rejected() {
        let policy = IntervalPolicy {
            slow_down_step: Duration::ZERO,
            max_interval: None,
        };
        assert!(policy.validate().is_err());
        assert!(IntervalPolicy::default().validate().is_ok());
    }
}
