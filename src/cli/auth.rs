//! CLI handlers for login and whoami.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::DeviceAuthClient;
use crate::cli::{LoginArgs, WhoamiArgs};
use crate::config::DeviceFlowConfig;
use crate::util::retry::RetryPolicy;

/// Handle `devicegrant login`.
pub async fn handle_login(args: LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DeviceFlowConfig::from_env()?;
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    if let Some(client_id) = args.client_id {
        config.client_id = client_id;
    }
    if let Some(scope) = args.scope {
        config.scope = scope;
    }
    if let Some(secs) = args.timeout_secs {
        config.poll_timeout = Duration::from_secs(secs);
    }

    let client = DeviceAuthClient::from_config(&config)?;
    println!("Authenticating with {}", client.base_url());

    let retry = RetryPolicy {
        max_attempts: args.retries.saturating_add(1),
        ..RetryPolicy::default()
    };
    let session = retry.execute(|| client.start_device_session()).await?;

    println!();
    println!("Please visit: {}", session.verification_uri());
    println!("And enter code: {}", session.user_code());
    if let Some(complete) = session.verification_uri_complete() {
        println!("Or open directly: {complete}");
    }
    println!();
    println!("Waiting for authorization... (Ctrl-C to cancel)");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let credential = client
        .poller()
        .poll_until_cancelled(&session, config.poll_timeout, &cancel)
        .await?;

    println!("Authentication successful!");
    println!(
        "  Token type: {}",
        if credential.token_type.is_empty() {
            "Bearer"
        } else {
            credential.token_type.as_str()
        }
    );
    println!(
        "  Expires: {}",
        credential.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    if credential.refresh_token.is_some() {
        println!("  Refresh token: issued");
    }

    match client.get_session(&credential.access_token).await {
        Ok(info) => println!("Logged in as: {}", info.user.email),
        Err(e) => tracing::debug!(error = %e, "session lookup after login failed"),
    }

    Ok(())
}

/// Handle `devicegrant whoami`.
pub async fn handle_whoami(args: WhoamiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DeviceFlowConfig::from_env()?;
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    let client = DeviceAuthClient::from_config(&config)?;
    let info = client.get_session(&args.token).await?;

    println!("User: {}", info.user.email);
    println!("  ID: {}", info.user.id);
    if let Some(name) = info.user.name {
        println!("  Name: {name}");
    }
    Ok(())
}
