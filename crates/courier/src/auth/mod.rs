//! User authentication via the OAuth 2.0 authorization-code flow
//!
//! Implements the three-step dance against a configured identity provider:
//! redirect the browser to the authorization endpoint with a CSRF state
//! token, exchange the returned code for a credential bundle, and fetch the
//! user's profile email. All state lives in the cookie session.

pub mod service;

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use url::Url;

use crate::config::AuthConfig;
use crate::error::{CourierError, Result};
use crate::web::session::{CREDENTIALS_KEY, EMAIL_KEY, OAUTH_STATE_KEY};

pub use service::{ServiceCredentialStore, ServiceCredentials};

/// The OAuth token set stored in the session after a successful login.
///
/// Created by [`AuthFlow::complete_auth`]; read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub granted_scopes: Vec<String>,
}

/// Query parameters delivered to the OAuth callback route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Successful token response from the identity provider
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Userinfo response; only the email is consumed
#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
}

/// Drives the authorization-code flow for browser logins
#[derive(Debug, Clone)]
pub struct AuthFlow {
    config: AuthConfig,
    client: reqwest::Client,
}

impl AuthFlow {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Begin the login dance: store a fresh CSRF state token in the session
    /// and return the authorization URL to redirect the browser to.
    pub async fn begin_auth(&self, session: &Session) -> Result<Url> {
        let state = uuid::Uuid::new_v4().to_string();
        session
            .insert(OAUTH_STATE_KEY, state.clone())
            .await
            .map_err(|e| CourierError::Session(e.to_string()))?;
        self.authorization_url(&state)
    }

    /// Build the authorization URL for the configured scope set
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| CourierError::Config(format!("Invalid auth_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("include_granted_scopes", "true")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url)
    }

    /// Complete the login dance from the provider's callback.
    ///
    /// Validates the CSRF state token against the one stored by
    /// [`begin_auth`], exchanges the authorization code for a credential
    /// bundle, fetches the user's email, and stores both in the session.
    /// A failed exchange never establishes a session.
    pub async fn complete_auth(
        &self,
        session: &Session,
        params: &CallbackParams,
    ) -> Result<CredentialBundle> {
        let stored_state: Option<String> = session
            .remove(OAUTH_STATE_KEY)
            .await
            .map_err(|e| CourierError::Session(e.to_string()))?;

        if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(CourierError::AuthExchange(format!(
                "Provider rejected authorization: {error}"
            )));
        }

        let returned_state = params.state.as_deref().unwrap_or_default();
        match stored_state {
            Some(ref expected) if !expected.is_empty() && expected == returned_state => {}
            _ => {
                return Err(CourierError::AuthExchange(
                    "OAuth state token missing or mismatched".to_string(),
                ));
            }
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                CourierError::AuthExchange("Callback did not include an authorization code".into())
            })?;

        let bundle = self.exchange_code(code).await?;
        let email = self.fetch_email(&bundle.access_token).await?;

        session
            .insert(CREDENTIALS_KEY, bundle.clone())
            .await
            .map_err(|e| CourierError::Session(e.to_string()))?;
        session
            .insert(EMAIL_KEY, email.clone())
            .await
            .map_err(|e| CourierError::Session(e.to_string()))?;

        tracing::info!("Authenticated user: {email}");
        Ok(bundle)
    }

    /// Clear all session state, returning the visitor to anonymous
    pub async fn logout(&self, session: &Session) -> Result<()> {
        session
            .flush()
            .await
            .map_err(|e| CourierError::Session(e.to_string()))
    }

    /// Exchange an authorization code for a credential bundle
    async fn exchange_code(&self, code: &str) -> Result<CredentialBundle> {
        let response = self
            .client
            .post(&self.config.token_url)
            .header("accept", "application/json")
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| CourierError::AuthExchange(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::AuthExchange(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CourierError::AuthExchange(format!("Invalid token payload: {e}")))?;

        let granted_scopes = token
            .scope
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_else(|| self.config.scopes.clone());

        Ok(CredentialBundle {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_endpoint: self.config.token_url.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            granted_scopes,
        })
    }

    /// Fetch the user's profile email with the freshly issued access token
    async fn fetch_email(&self, access_token: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| CourierError::AuthExchange(format!("Userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::AuthExchange(format!(
                "Userinfo endpoint returned {status}"
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| CourierError::AuthExchange(format!("Invalid userinfo payload: {e}")))?;
        Ok(info.email)
    }
}
