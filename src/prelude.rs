//! Convenience re-exports for common use.

pub use crate::auth::{
    start_device_session, Credential, DeviceAuthClient, DeviceSession, IntervalPolicy,
    PollOutcome, Poller,
};
pub use crate::config::DeviceFlowConfig;
pub use crate::error::{DeviceFlowError, Result};
pub use tokio_util::sync::CancellationToken;
