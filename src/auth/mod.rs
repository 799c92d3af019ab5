//! OAuth 2.0 device authorization grant: session initiation and token polling.

pub mod client;
pub mod credential;
pub mod outcome;
pub mod poller;
pub mod response;
pub mod session;

pub use client::{start_device_session, DeviceAuthClient};
pub use credential::{Credential, SessionInfo, SessionUser};
pub use outcome::PollOutcome;
pub use poller::{IntervalPolicy, PollState, Poller, Sleeper, TokenExchange, TokioSleeper};
pub use response::{TokenErrorCode, DEVICE_CODE_GRANT_TYPE};
pub use session::{DeviceSession, DEFAULT_POLL_INTERVAL_SECS};
