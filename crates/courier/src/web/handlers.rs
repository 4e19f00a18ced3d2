//! Route handlers
//!
//! Every failure that escapes a handler is converted at this boundary to a
//! JSON envelope; only a downstream non-200 preserves its original status
//! code and body. The browser always receives JSON, even for catastrophic
//! failures.

use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_sessions::Session;

use crate::auth::CallbackParams;
use crate::error::CourierError;
use crate::relay::{FileUpload, RelayPayload};

use super::session::{credentials, ensure_session};
use super::{AppState, Dispatcher};

const CHAT_PAGE: &str = include_str!("../../templates/index.html");
const LOGIN_PAGE: &str = include_str!("../../templates/login.html");

/// Generic 500 envelope; specific failure reasons are only logged
fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": "An internal server error occurred."
        })),
    )
        .into_response()
}

/// Chat UI, or a redirect to the login page when authentication is enabled
/// and absent
pub async fn home(State(state): State<Arc<AppState>>, session: Session) -> Response {
    if state.config.auth.enabled {
        match credentials(&session).await {
            Ok(Some(_)) => {}
            Ok(None) => return Redirect::to("/login").into_response(),
            Err(e) => {
                tracing::error!("Session read failed: {e}");
                return internal_error();
            }
        }
    }

    if let Err(e) = ensure_session(&session).await {
        tracing::error!("Session write failed: {e}");
        return internal_error();
    }

    Html(CHAT_PAGE).into_response()
}

/// Login entry point; only mounted when authentication is enabled
pub async fn login() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Start the OAuth dance: store the CSRF state and redirect to the provider
pub async fn begin_auth(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let Some(auth) = &state.auth else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match auth.begin_auth(&session).await {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            tracing::error!("Failed to begin auth: {e}");
            internal_error()
        }
    }
}

/// Provider callback: validate state, exchange the code, store credentials
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(auth) = &state.auth else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match auth.complete_auth(&session, &params).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::error!("Auth exchange failed: {e}");
            internal_error()
        }
    }
}

/// Clear all session state and return to the login page
pub async fn logout(State(state): State<Arc<AppState>>, session: Session) -> Response {
    if let Some(auth) = &state.auth {
        if let Err(e) = auth.logout(&session).await {
            tracing::error!("Logout failed: {e}");
            return internal_error();
        }
    }
    Redirect::to("/login").into_response()
}

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Chat endpoint: parse the multipart request, dispatch to the configured
/// backend, and wrap the outcome in the response envelope.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Multipart,
) -> Response {
    let mut access_token = None;
    if state.config.auth.enabled {
        match credentials(&session).await {
            Ok(Some(bundle)) => access_token = Some(bundle.access_token),
            Ok(None) => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "status": "error",
                        "message": "User not authenticated"
                    })),
                )
                    .into_response();
            }
            Err(e) => {
                tracing::error!("Session read failed: {e}");
                return internal_error();
            }
        }
    }

    let session_id = match ensure_session(&session).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Session write failed: {e}");
            return internal_error();
        }
    };

    let (message, file) = match read_chat_request(multipart).await {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Failed to parse chat request: {e}");
            return internal_error();
        }
    };

    match &state.dispatcher {
        Dispatcher::Webhook(relay) => {
            match relay
                .relay(&message, file.as_ref(), &session_id, access_token.as_deref())
                .await
            {
                Ok(payload) => {
                    let response = match payload {
                        RelayPayload::Json(value) => value,
                        RelayPayload::Text(text) => Value::String(text),
                    };
                    Json(json!({
                        "status": "success",
                        "message": "Message and file (if any) sent to n8n.",
                        "response_from_n8n": response,
                    }))
                    .into_response()
                }
                Err(CourierError::Downstream { status, body }) => {
                    let code =
                        StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                    (
                        code,
                        Json(json!({
                            "status": "error",
                            "message": format!(
                                "Failed to send data to n8n. Status code: {status}"
                            ),
                            "n8n_response": body,
                        })),
                    )
                        .into_response()
                }
                Err(e) => {
                    tracing::error!("Webhook relay failed: {e}");
                    internal_error()
                }
            }
        }
        Dispatcher::Agent(agent) => {
            match agent.relay(&message, file.as_ref(), &session_id).await {
                Ok(output) => Json(json!({
                    "status": "success",
                    "message": "Message and file (if any) processed.",
                    "response_from_n8n": output,
                }))
                .into_response(),
                Err(e) => {
                    tracing::error!("Agent relay failed: {e}");
                    internal_error()
                }
            }
        }
    }
}

/// Pull the `message` field and optional `file` part out of the multipart
/// body. Both are optional; an empty filename counts as no file.
async fn read_chat_request(
    mut multipart: Multipart,
) -> crate::error::Result<(String, Option<FileUpload>)> {
    let mut message = String::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CourierError::Validation(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("message") => {
                message = field
                    .text()
                    .await
                    .map_err(|e| CourierError::Validation(e.to_string()))?;
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| CourierError::Validation(e.to_string()))?;
                if !filename.is_empty() {
                    file = Some(FileUpload {
                        filename,
                        bytes: bytes.to_vec(),
                        mime_type,
                    });
                }
            }
            _ => {}
        }
    }

    Ok((message, file))
}
