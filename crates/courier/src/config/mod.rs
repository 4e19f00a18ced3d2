use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Courier
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Relay dispatch configuration
    #[serde(default)]
    pub relay: RelayConfig,
    /// User authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Agent-mode configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Which backend `/api/chat` dispatches to.
///
/// Selected once at deployment time; there is no request-time switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Forward the payload to the configured automation webhook
    #[default]
    Webhook,
    /// Run the tool-calling agent loop
    Agent,
}

/// How the webhook payload is encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// multipart/form-data with a `file` part that is always present
    #[default]
    Multipart,
    /// JSON body with the file bytes base64-encoded under `filedata`
    Json,
}

/// Relay dispatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Backend mode, fixed for the lifetime of the process
    #[serde(default)]
    pub mode: RelayMode,
    /// Webhook URL the payload is POSTed to in webhook mode
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    /// Wire encoding for the webhook payload
    #[serde(default)]
    pub payload: PayloadFormat,
    /// Optional request timeout in seconds; no timeout when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::default(),
            webhook_url: default_webhook_url(),
            payload: PayloadFormat::default(),
            timeout_secs: None,
        }
    }
}

fn default_webhook_url() -> String {
    "http://localhost:5678/webhook/chat".to_string()
}

/// User authentication configuration
///
/// When `enabled` is false the login routes are not mounted and `/api/chat`
/// accepts anonymous requests.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Whether the OAuth login dance gates the UI and API
    #[serde(default)]
    pub enabled: bool,
    /// OAuth client identifier
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,
    /// Authorization endpoint the browser is redirected to
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Token endpoint for the authorization-code exchange
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Userinfo endpoint queried for the profile email
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    /// Redirect URI registered with the identity provider
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Scope set requested on login
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            userinfo_url: default_userinfo_url(),
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
        }
    }
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v2/userinfo".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/oauth2callback".to_string()
}

fn default_scopes() -> Vec<String> {
    [
        "openid",
        "https://www.googleapis.com/auth/userinfo.email",
        "https://www.googleapis.com/auth/userinfo.profile",
        "https://www.googleapis.com/auth/gmail.send",
        "https://www.googleapis.com/auth/calendar.events",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Agent-mode configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the OpenAI-compatible chat-completions API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API key; falls back to the environment variable below when unset
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model driving the tool-calling loop
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for image description
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Sampling temperature for the loop
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token cap per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on thought/tool iterations per request
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Conversational-memory window, in turns, kept per session
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,
    /// Seconds of inactivity after which a session's memory is evicted
    #[serde(default = "default_memory_idle_secs")]
    pub memory_idle_secs: u64,
    /// On-disk JSON file holding the service-level OAuth credentials
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    /// Base URL for the provider APIs the tools call
    #[serde(default = "default_provider_api_base")]
    pub provider_api_base: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            vision_model: default_vision_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
            memory_window: default_memory_window(),
            memory_idle_secs: default_memory_idle_secs(),
            credentials_file: default_credentials_file(),
            provider_api_base: default_provider_api_base(),
        }
    }
}

impl AgentConfig {
    /// Resolve the API key: explicit config value first, env var fallback
    pub fn resolve_api_key(&self) -> crate::error::Result<String> {
        match &self.api_key {
            Some(key) if !key.is_empty() => Ok(key.clone()),
            _ => std::env::var(&self.api_key_env).map_err(|_| {
                crate::error::CourierError::Config(format!(
                    "API key env var '{}' not set",
                    self.api_key_env
                ))
            }),
        }
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "COURIER_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_iterations() -> usize {
    8
}

fn default_memory_window() -> usize {
    5
}

fn default_memory_idle_secs() -> u64 {
    1800
}

fn default_credentials_file() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".courier").join("service_token.json"))
        .unwrap_or_else(|| PathBuf::from("service_token.json"))
}

fn default_provider_api_base() -> String {
    "https://www.googleapis.com".to_string()
}
