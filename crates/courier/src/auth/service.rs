//! Service-level credentials for agent tools
//!
//! The agent's side-effecting tools authenticate as the deployment itself,
//! not as the logged-in user. The token set lives in an on-disk JSON file
//! and is refreshed in place when expired. Plaintext-at-rest is a known
//! gap; an encrypted store or secrets manager is an external collaborator.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CourierError, Result};

/// Seconds of slack before the recorded expiry at which a token is
/// considered stale.
const EXPIRY_SKEW_SECS: i64 = 60;

/// The deployment-owned OAuth identity used by agent tools.
///
/// Independent of, and never derived from, any end user's login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ServiceCredentials {
    /// Whether the access token is past (or within skew of) its expiry.
    /// Credentials without a recorded expiry are treated as valid.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() + ChronoDuration::seconds(EXPIRY_SKEW_SECS) >= at,
            None => false,
        }
    }
}

/// Refresh response from the token endpoint
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Loads, refreshes, and persists the service credential file
#[derive(Debug, Clone)]
pub struct ServiceCredentialStore {
    path: PathBuf,
    client: reqwest::Client,
}

impl ServiceCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            client: reqwest::Client::new(),
        }
    }

    /// Return a currently valid access token, refreshing the on-disk
    /// credentials in place when they have expired.
    pub async fn access_token(&self) -> Result<String> {
        let credentials = self.load()?;
        if !credentials.is_expired() {
            return Ok(credentials.access_token);
        }

        tracing::info!("Service credentials expired, refreshing");
        let refreshed = self.refresh(credentials).await?;
        self.save(&refreshed)?;
        Ok(refreshed.access_token)
    }

    /// Read the credential file
    pub fn load(&self) -> Result<ServiceCredentials> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            CourierError::Config(format!(
                "Failed to read credentials file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| CourierError::Serialization(format!("Invalid credentials file: {e}")))
    }

    /// Write the credential file back, creating parent directories as needed
    pub fn save(&self, credentials: &ServiceCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(credentials)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Exchange the refresh token for a fresh access token
    async fn refresh(&self, mut credentials: ServiceCredentials) -> Result<ServiceCredentials> {
        let refresh_token = credentials.refresh_token.clone().ok_or_else(|| {
            CourierError::AuthExchange("Service credentials expired with no refresh token".into())
        })?;

        let response = self
            .client
            .post(&credentials.token_endpoint)
            .header("accept", "application/json")
            .form(&[
                ("refresh_token", refresh_token.as_str()),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| CourierError::AuthExchange(format!("Refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::AuthExchange(format!(
                "Refresh rejected with {status}: {body}"
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| CourierError::AuthExchange(format!("Invalid refresh payload: {e}")))?;

        credentials.access_token = refreshed.access_token;
        credentials.expires_at = refreshed
            .expires_in
            .map(|secs| Utc::now() + ChronoDuration::seconds(secs));
        Ok(credentials)
    }
}
