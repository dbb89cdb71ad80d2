//! Chat completion gateway.
//!
//! The single point where the advisor talks to the language model. Each call
//! is one outbound request with the system instruction prepended; failures
//! are logged here and reported to the caller as `None`.

use std::sync::Arc;

use advisor_config::AppConfig;
use advisor_core::message::Message;
use advisor_core::provider::{Provider, ProviderRequest, ToolChoice, ToolDefinition};
use tracing::{debug, warn};

pub struct ChatGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
}

impl ChatGateway {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: system_prompt.into(),
        }
    }

    /// Gateway with the model, temperature, token cap and system prompt from config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let mut gateway = Self::new(provider, &config.model, &config.system_prompt)
            .with_temperature(config.temperature);
        gateway.max_tokens = config.max_tokens;
        gateway
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Send `conversation` to the model and return its first choice.
    ///
    /// The system instruction goes ahead of the conversation on every call and
    /// is never written back into it. Tool descriptors, when given, are offered
    /// under `tool_choice`.
    pub async fn complete(
        &self,
        conversation: &[Message],
        tools: Option<&[ToolDefinition]>,
        tool_choice: ToolChoice,
    ) -> Option<Message> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend_from_slice(conversation);

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.map(<[ToolDefinition]>::to_vec).unwrap_or_default(),
            tool_choice,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    debug!(
                        model = %response.model,
                        tokens = usage.total_tokens,
                        "Chat completion"
                    );
                }
                Some(response.message)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Chat completion failed");
                None
            }
        }
    }
}
