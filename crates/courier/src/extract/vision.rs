//! Image description via an OpenAI-compatible vision model

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::config::AgentConfig;
use crate::error::{CourierError, Result};

/// Prompt sent alongside the image bytes
const DESCRIBE_PROMPT: &str =
    "Describe this image in detail, focusing on key objects, colors, and overall scene.";

/// Client for one-shot image description calls
#[derive(Debug, Clone, Default)]
pub struct VisionClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl VisionClient {
    /// Build a vision client from the agent configuration. The API key
    /// comes from the config when set, otherwise from the environment
    /// variable named in `api_key_env`.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key,
            model: config.vision_model.clone(),
        })
    }

    /// Request a textual description of the image bytes
    pub async fn describe(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        let mime = if mime_type.trim().is_empty() {
            "image/jpeg"
        } else {
            mime_type
        };
        let encoded = STANDARD.encode(bytes);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": DESCRIBE_PROMPT},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:{mime};base64,{encoded}")
                    }}
                ]
            }],
            "max_tokens": 512,
        });

        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CourierError::Agent(format!("Vision request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CourierError::Agent(format!(
                "Vision API returned {status}: {text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CourierError::Agent(format!("Invalid vision payload: {e}")))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CourierError::Agent("Vision response had no content".to_string()))
    }
}
