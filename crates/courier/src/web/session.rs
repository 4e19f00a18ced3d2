//! Browser session state
//!
//! A thin layer over the cookie-session store: an opaque per-browser
//! identifier, and (when authentication is enabled) the credential bundle
//! and user email written by the auth flow.

use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::CredentialBundle;
use crate::error::{CourierError, Result};

/// Session key for the opaque per-browser identifier
pub const SESSION_ID_KEY: &str = "sessionId";
/// Session key for the user's credential bundle
pub const CREDENTIALS_KEY: &str = "credentials";
/// Session key for the authenticated user's email
pub const EMAIL_KEY: &str = "email";
/// Session key for the OAuth CSRF state token
pub const OAUTH_STATE_KEY: &str = "oauth_state";

/// Ensure the session carries an opaque identifier, generating a fresh
/// UUID on first visit. Idempotent within a browser session.
pub async fn ensure_session(session: &Session) -> Result<String> {
    if let Some(existing) = session
        .get::<String>(SESSION_ID_KEY)
        .await
        .map_err(session_error)?
    {
        return Ok(existing);
    }

    let id = Uuid::new_v4().to_string();
    session
        .insert(SESSION_ID_KEY, id.clone())
        .await
        .map_err(session_error)?;
    Ok(id)
}

/// The credential bundle stored by a completed login, if any
pub async fn credentials(session: &Session) -> Result<Option<CredentialBundle>> {
    session.get(CREDENTIALS_KEY).await.map_err(session_error)
}

/// The authenticated user's email, if any
pub async fn user_email(session: &Session) -> Result<Option<String>> {
    session.get(EMAIL_KEY).await.map_err(session_error)
}

fn session_error(e: tower_sessions::session::Error) -> CourierError {
    CourierError::Session(e.to_string())
}
