//! devicegrant — OAuth 2.0 Device Authorization Grant client
//!
//! Lets a headless or input-constrained program obtain credentials by sending
//! the user to a verification page on another device, then polling the
//! authorization server until the grant is approved, denied, or expires.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use devicegrant::prelude::*;
//!
//! # async fn example() -> devicegrant::error::Result<()> {
//! let client = DeviceAuthClient::new("https://auth.example/api/auth", "my-cli")?;
//! let session = client.start_device_session().await?;
//! println!("Visit {} and enter {}", session.verification_uri(), session.user_code());
//!
//! match client.poll_for_credential(&session, Duration::from_secs(300)).await {
//!     Ok(credential) => println!("authorized, expires {}", credential.expires_at()),
//!     Err(e) => eprintln!("login failed ({}): {e}", e.reason()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
