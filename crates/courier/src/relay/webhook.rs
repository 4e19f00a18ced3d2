//! Webhook relay mode
//!
//! Builds the outbound payload and performs one synchronous POST to the
//! configured webhook URL, with no retry. The downstream receiver depends
//! on field *presence*: `message` and `filename` are always sent, and in
//! multipart encoding the `file` part exists even when no file was
//! uploaded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use crate::config::{PayloadFormat, RelayConfig};
use crate::error::{CourierError, Result};

use super::{FileUpload, RelayPayload};

/// Forwards chat requests to the automation webhook
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    config: RelayConfig,
}

impl WebhookRelay {
    /// Build the relay with its dedicated HTTP client.
    ///
    /// No timeout is applied unless `timeout_secs` is configured; a hung
    /// downstream endpoint then blocks the request until it resolves.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| CourierError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Forward one chat request and normalize the response.
    ///
    /// HTTP 200 yields the decoded JSON body, falling back to raw text.
    /// Any other status becomes [`CourierError::Downstream`] carrying that
    /// exact status code and body. Transport failures are logged with
    /// their specific reason and returned as [`CourierError::Transport`],
    /// which the route boundary collapses to a generic message.
    pub async fn relay(
        &self,
        message: &str,
        file: Option<&FileUpload>,
        session_id: &str,
        access_token: Option<&str>,
    ) -> Result<RelayPayload> {
        let request = match self.config.payload {
            PayloadFormat::Multipart => {
                let form = build_form(message, file, session_id, access_token)?;
                self.client.post(&self.config.webhook_url).multipart(form)
            }
            PayloadFormat::Json => {
                let body = build_json(message, file, session_id, access_token);
                self.client.post(&self.config.webhook_url).json(&body)
            }
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!("Webhook request to {} failed: {e}", self.config.webhook_url);
            CourierError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            tracing::error!("Failed to read webhook response body: {e}");
            CourierError::Transport(e.to_string())
        })?;

        if status == 200 {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => Ok(RelayPayload::Json(value)),
                Err(_) => Ok(RelayPayload::Text(text)),
            }
        } else {
            Err(CourierError::Downstream { status, body: text })
        }
    }
}

/// Build the multipart body. The `file` part is always present: empty
/// filename, empty bytes, and a generic content type stand in when no file
/// was uploaded.
fn build_form(
    message: &str,
    file: Option<&FileUpload>,
    session_id: &str,
    access_token: Option<&str>,
) -> Result<Form> {
    let mut form = Form::new()
        .text("message", message.to_string())
        .text(
            "filename",
            file.map(|f| f.filename.clone()).unwrap_or_default(),
        )
        .text("sessionId", session_id.to_string());

    if let Some(token) = access_token {
        form = form.text("accessToken", token.to_string());
    }

    let part = match file {
        Some(f) => Part::bytes(f.bytes.clone())
            .file_name(f.filename.clone())
            .mime_str(&f.mime_type)
            .map_err(|e| CourierError::Validation(format!("Invalid MIME type: {e}")))?,
        None => Part::bytes(Vec::new())
            .file_name("")
            .mime_str("application/octet-stream")
            .map_err(|e| CourierError::Validation(format!("Invalid MIME type: {e}")))?,
    };

    Ok(form.part("file", part))
}

/// Build the JSON body, base64-encoding the file bytes under `filedata`
fn build_json(
    message: &str,
    file: Option<&FileUpload>,
    session_id: &str,
    access_token: Option<&str>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "message": message,
        "filename": file.map(|f| f.filename.clone()).unwrap_or_default(),
        "filedata": file.map(|f| STANDARD.encode(&f.bytes)).unwrap_or_default(),
        "sessionId": session_id,
    });
    if let Some(token) = access_token {
        body["accessToken"] = serde_json::Value::String(token.to_string());
    }
    body
}
