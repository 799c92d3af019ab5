use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{normalize_base_url, DeviceFlowConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SCOPE};
use crate::error::{DeviceFlowError, Result, ServerFailure};

use super::poller::{IntervalPolicy, Poller, TokenExchange};
use super::response::{
    classify_token_response, decode_device_session, DeviceCodeRequest, TokenRequest,
    DEVICE_CODE_GRANT_TYPE,
};
use super::{Credential, DeviceSession, PollOutcome, SessionInfo};

const DEVICE_CODE_PATH: &str = "/device/code";
const DEVICE_TOKEN_PATH: &str = "/device/token";
const SESSION_PATH: &str = "/session";

/// HTTP client for one authorization server and client registration.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use devicegrant::auth::DeviceAuthClient;
///
/// # async fn example() -> devicegrant::error::Result<()> {
/// let client = DeviceAuthClient::new("https://auth.example/api/auth", "my-cli")?;
/// let session = client.start_device_session().await?;
/// println!("Visit {} and enter {}", session.verification_uri(), session.user_code());
/// let credential = client
///     .poll_for_credential(&session, Duration::from_secs(300))
///     .await?;
/// # let _ = credential;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceAuthClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    scope: String,
    interval_policy: IntervalPolicy,
}

impl DeviceAuthClient {
    pub fn new(base_url: &str, client_id: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(DeviceFlowError::Configuration(
                "client id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client: build_http_client(DEFAULT_REQUEST_TIMEOUT)?,
            base_url: normalize_base_url(base_url)?,
            client_id,
            scope: DEFAULT_SCOPE.to_string(),
            interval_policy: IntervalPolicy::default(),
        })
    }

    pub fn from_config(config: &DeviceFlowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
            base_url: config.normalized_base_url()?,
            client_id: config.client_id.clone(),
            scope: config.scope.clone(),
            interval_policy: config.interval_policy,
        })
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_interval_policy(mut self, policy: IntervalPolicy) -> Self {
        self.interval_policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Request a device code and user code. Never retries.
    pub async fn start_device_session(&self) -> Result<DeviceSession> {
        let url = format!("{}{DEVICE_CODE_PATH}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&DeviceCodeRequest {
                client_id: &self.client_id,
                scope: &self.scope,
            })
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(status, "device code response");

        let session = decode_device_session(status, &body)?;
        debug!(
            interval_secs = session.interval_secs(),
            expires_in = ?session.expires_in(),
            "device session started"
        );
        Ok(session)
    }

    /// Issue one token-exchange request and classify the response.
    pub async fn request_token(&self, device_code: &str) -> PollOutcome {
        let url = format!("{}{DEVICE_TOKEN_PATH}", self.base_url);
        let resp = match self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&TokenRequest {
                grant_type: DEVICE_CODE_GRANT_TYPE,
                device_code,
                client_id: &self.client_id,
            })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return e.into(),
        };
        let status = resp.status().as_u16();
        let outcome = match resp.text().await {
            Ok(body) => classify_token_response(status, &body),
            Err(e) => return e.into(),
        };
        if let PollOutcome::ServerError(failure) = &outcome {
            debug!(status, error_code = ?failure.error, "unexpected token response");
        }
        outcome
    }

    /// Poll the token endpoint until the grant resolves or `timeout` elapses.
    pub async fn poll_for_credential(
        &self,
        session: &DeviceSession,
        timeout: Duration,
    ) -> Result<Credential> {
        self.poller().poll(session, timeout).await
    }

    /// A [`Poller`] bound to this client and its interval policy.
    pub fn poller(&self) -> Poller {
        Poller::new(Arc::new(self.clone())).with_interval_policy(self.interval_policy)
    }

    /// Look up the identity behind an access token.
    pub async fn get_session(&self, access_token: &str) -> Result<SessionInfo> {
        let url = format!("{}{SESSION_PATH}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(DeviceFlowError::Server(ServerFailure::status(
                status.as_u16(),
                body,
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TokenExchange for DeviceAuthClient {
    async fn exchange(&self, device_code: &str) -> PollOutcome {
        self.request_token(device_code).await
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DeviceFlowError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Request a device session from `base_url` for `client_id` with `scope`.
pub async fn start_device_session(
    base_url: &str,
    client_id: &str,
    scope: &str,
) -> Result<DeviceSession> {
    DeviceAuthClient::new(base_url, client_id)?
        .with_scope(scope)
        .start_device_session()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_base_url() {
        let client = DeviceAuthClient::new("https://auth.example/api/auth/", "cli").unwrap();
        assert_eq!(client.base_url(), "https://auth.example/api/auth");
        assert_eq!(client.client_id(), "cli");
    }

    #[test]
    fn new_rejects_empty_inputs() {
        assert!(DeviceAuthClient::new("", "cli").is_err());
        assert!(DeviceAuthClient::new("https://auth.example", "").is_err());
    }

    #[test]
    fn from_config_carries_interval_policy() {
        let policy = IntervalPolicy::default().with_max_interval(Duration::from_secs(30));
        let config = DeviceFlowConfig::new("https://auth.example").with_interval_policy(policy);
        let client = DeviceAuthClient::from_config(&config).unwrap();
        assert_eq!(client.poller().interval_policy(), &policy);
    }
}
