//! Side-effecting tools available to the agent loop
//!
//! Each tool authenticates with the service-level credentials and returns a
//! plain string: success messages carry the provider's identifier or link,
//! failure messages carry the error text inline. A tool never fails the
//! loop.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::ServiceCredentialStore;

use super::llm::ToolDefinition;

/// A callable tool advertised to the model
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    /// Execute with JSON-encoded arguments. Always returns a string; errors
    /// are reported inline, never raised.
    async fn call(&self, arguments: &str) -> String;
}

/// The fixed set of tools available to the loop
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the two supported actions: email delivery and
    /// calendar event creation.
    pub fn new(credentials: Arc<ServiceCredentialStore>, api_base: String) -> Self {
        Self {
            tools: vec![
                Box::new(EmailTool::new(credentials.clone(), api_base.clone())),
                Box::new(CalendarTool::new(credentials, api_base)),
            ],
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub async fn call(&self, name: &str, arguments: &str) -> String {
        for tool in &self.tools {
            if tool.definition().function.name == name {
                return tool.call(arguments).await;
            }
        }
        format!("Error: Tool '{name}' not found")
    }
}

/// Sends an email through the provider's message-send endpoint
pub struct EmailTool {
    client: reqwest::Client,
    credentials: Arc<ServiceCredentialStore>,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct EmailArgs {
    to: String,
    subject: String,
    #[serde(alias = "message_text")]
    body: String,
}

impl EmailTool {
    pub fn new(credentials: Arc<ServiceCredentialStore>, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            api_base,
        }
    }

    async fn send(&self, args: EmailArgs) -> Result<String, String> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|e| e.to_string())?;

        let raw = URL_SAFE.encode(format!(
            "To: {}\r\nSubject: {}\r\n\r\n{}",
            args.to, args.subject, args.body
        ));
        let url = format!(
            "{}/gmail/v1/users/me/messages/send",
            self.api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({"raw": raw}))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("{status}: {text}"));
        }

        let payload: Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(payload["id"].as_str().unwrap_or("unknown").to_string())
    }
}

#[async_trait]
impl Tool for EmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "send_email",
            "Send an email message. Use only when the user explicitly asks to send or draft an email.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Recipient email address"},
                    "subject": {"type": "string", "description": "Subject line"},
                    "body": {"type": "string", "description": "Plain-text message body"}
                },
                "required": ["to", "subject", "body"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> String {
        let args: EmailArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error sending email: invalid arguments: {e}"),
        };
        match self.send(args).await {
            Ok(id) => format!("Email sent successfully! Message Id: {id}"),
            Err(e) => format!("Error sending email: {e}"),
        }
    }
}

/// Creates an event through the provider's calendar endpoint
pub struct CalendarTool {
    client: reqwest::Client,
    credentials: Arc<ServiceCredentialStore>,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct CalendarArgs {
    summary: String,
    #[serde(default)]
    description: String,
    start_time: String,
    end_time: String,
    #[serde(default = "default_calendar_id")]
    calendar_id: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

impl CalendarTool {
    pub fn new(credentials: Arc<ServiceCredentialStore>, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            api_base,
        }
    }

    async fn create(&self, args: CalendarArgs) -> Result<String, String> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|e| e.to_string())?;

        let url = format!(
            "{}/calendar/v3/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            args.calendar_id
        );
        let event = serde_json::json!({
            "summary": args.summary,
            "description": args.description,
            "start": {"dateTime": args.start_time, "timeZone": "UTC"},
            "end": {"dateTime": args.end_time, "timeZone": "UTC"},
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&event)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("{status}: {text}"));
        }

        let payload: Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(payload["htmlLink"].as_str().unwrap_or("unknown").to_string())
    }
}

#[async_trait]
impl Tool for CalendarTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "create_calendar_event",
            "Create a calendar event with ISO-8601 start and end timestamps.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string", "description": "Event title"},
                    "description": {"type": "string", "description": "Event description"},
                    "start_time": {"type": "string", "description": "Start, ISO-8601 (e.g. 2023-10-27T10:00:00-07:00)"},
                    "end_time": {"type": "string", "description": "End, ISO-8601"},
                    "calendar_id": {"type": "string", "description": "Target calendar (default: primary)"}
                },
                "required": ["summary", "start_time", "end_time"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> String {
        let args: CalendarArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error creating calendar event: invalid arguments: {e}"),
        };
        match self.create(args).await {
            Ok(link) => format!("Event created: {link}"),
            Err(e) => format!("Error creating calendar event: {e}"),
        }
    }
}
