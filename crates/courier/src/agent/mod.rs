//! Agent relay mode
//!
//! Combines the chat message with extracted file text and drives a bounded
//! tool-calling loop against an OpenAI-compatible chat-completions API. The
//! loop may invoke side-effecting tools (email delivery, calendar event
//! creation) using the service-level credentials, never the end user's
//! session credentials.

mod llm;
mod memory;
mod tools;

pub use llm::{AssistantReply, ChatClient, ChatMessage, FunctionCall, ToolCall, ToolDefinition};
pub use memory::ConversationMemory;
pub use tools::{CalendarTool, EmailTool, Tool, ToolRegistry};

use std::sync::Arc;
use std::time::Duration;

use crate::auth::ServiceCredentialStore;
use crate::config::AgentConfig;
use crate::error::{CourierError, Result};
use crate::extract::{Extractor, VisionClient};
use crate::relay::FileUpload;

/// Persona and ground rules for the assistant
const SYSTEM_PROMPT: &str = "\
You are a helpful, moderate, and efficient assistant. Complete user \
requests accurately and concisely.

Reply quickly and to the point; keep responses short unless details are \
requested. Use a natural, conversational tone and respond in plain text \
only. Use the email tool only when the user's explicit request is to send \
or draft an email, and the calendar tool only when asked to schedule an \
event. If a request to send an email lacks a recipient address, ask for it \
instead of guessing. Do not narrate your decision-making or tool usage; \
respond directly to the request.";

/// Annotation inserted between the user's message and extracted file text
const FILE_ANNOTATION: &str = "\n Here is the data extracted from the file given \n";

/// Drives the agent loop for chat requests
pub struct AgentDispatcher {
    client: ChatClient,
    tools: ToolRegistry,
    memory: ConversationMemory,
    extractor: Extractor,
    max_iterations: usize,
}

impl AgentDispatcher {
    /// Build the dispatcher from configuration resolved at process start.
    /// The credential store is shared with the startup preflight check.
    pub fn new(config: &AgentConfig, credentials: Arc<ServiceCredentialStore>) -> Result<Self> {
        let client = ChatClient::new(config)?;
        let vision = VisionClient::new(config)?;
        Ok(Self {
            client,
            tools: ToolRegistry::new(credentials, config.provider_api_base.clone()),
            memory: ConversationMemory::new(
                config.memory_window,
                Duration::from_secs(config.memory_idle_secs),
            ),
            extractor: Extractor::new(Some(vision)),
            max_iterations: config.max_iterations,
        })
    }

    /// Handle one chat request: extract file text if present, run the tool
    /// loop, and record the exchange in the session's memory window.
    ///
    /// Extraction never fails; its error strings are appended to the
    /// message like any other insight. Loop and tool failures surface as
    /// [`CourierError::Agent`], which the route boundary collapses to a
    /// generic message.
    pub async fn relay(
        &self,
        message: &str,
        file: Option<&FileUpload>,
        session_id: &str,
    ) -> Result<String> {
        let mut combined = message.to_string();
        if let Some(f) = file {
            let insights = self
                .extractor
                .extract(&f.filename, &f.bytes, &f.mime_type)
                .await;
            if !insights.is_empty() {
                combined.push_str(FILE_ANNOTATION);
                combined.push_str(&insights);
            }
        }

        let output = self.run_loop(session_id, &combined).await?;
        self.memory
            .record(session_id, combined, output.clone());
        Ok(output)
    }

    /// The bounded thought/tool iteration loop
    async fn run_loop(&self, session_id: &str, input: &str) -> Result<String> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        messages.extend(self.memory.history(session_id));
        messages.push(ChatMessage::user(input));

        let definitions = self.tools.definitions();

        for iteration in 0..self.max_iterations {
            let reply = self.client.chat(&messages, &definitions).await?;

            if reply.tool_calls.is_empty() {
                return Ok(reply
                    .content
                    .unwrap_or_else(|| "No response from agent.".to_string()));
            }

            tracing::debug!(
                "Iteration {iteration}: {} tool call(s) requested",
                reply.tool_calls.len()
            );
            messages.push(ChatMessage::assistant_tool_calls(
                reply.content.clone(),
                reply.tool_calls.clone(),
            ));
            for call in &reply.tool_calls {
                let result = self
                    .tools
                    .call(&call.function.name, &call.function.arguments)
                    .await;
                messages.push(ChatMessage::tool(call.id.clone(), result));
            }
        }

        Err(CourierError::Agent(format!(
            "Tool loop exceeded {} iterations",
            self.max_iterations
        )))
    }
}
