//! Relay dispatch to the downstream webhook
//!
//! Webhook mode marshals the chat request into a single outbound POST and
//! normalizes the response; agent mode lives in [`crate::agent`]. The mode
//! is fixed at deployment time by [`crate::config::RelayMode`].

mod webhook;

pub use webhook::WebhookRelay;

/// A file attached to a chat request, held in memory for the one call
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Body of a successful downstream response.
///
/// A 200 with a JSON body is surfaced verbatim; a 200 with anything else
/// falls back to the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayPayload {
    Json(serde_json::Value),
    Text(String),
}
