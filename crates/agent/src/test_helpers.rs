//! Shared test helpers: a scripted provider and stub tools.

use std::sync::Mutex;

use advisor_core::error::{ProviderError, ToolError};
use advisor_core::message::{Message, MessageToolCall};
use advisor_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use advisor_core::tool::{Tool, ToolKind, ToolResult};

/// A mock provider that returns a sequence of scripted responses
/// and records every request it receives.
///
/// Once the script runs out it answers `NotConfigured`, which the gateway
/// reports as no response.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(messages: Vec<Message>) -> Self {
        Self::new(messages.into_iter().map(|m| Ok(response(m))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::NotConfigured("script exhausted".into()));
        }
        responses.remove(0)
    }
}

pub fn response(message: Message) -> ProviderResponse {
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// An assistant message requesting the given calls.
pub fn calls(calls: Vec<MessageToolCall>) -> Message {
    let mut msg = Message::assistant("");
    msg.content = None;
    msg.tool_calls = calls;
    msg
}

pub fn call(id: &str, name: &str, arguments: &str) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}

/// `get_courses` stub that lists one course per subject and counts invocations.
#[derive(Default)]
pub struct StubCourses {
    pub invocations: Mutex<Vec<serde_json::Value>>,
}

#[async_trait::async_trait]
impl Tool for StubCourses {
    fn kind(&self) -> ToolKind {
        ToolKind::GetCourses
    }

    fn description(&self) -> &str {
        "List courses for a subject"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {"subject": {"type": "string"}},
            "required": ["subject"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.invocations.lock().unwrap().push(arguments.clone());
        let subject = arguments["subject"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'subject' argument".into()))?;
        Ok(ToolResult::json(serde_json::json!([format!("{subject}101: Intro to {subject}")])))
    }
}

/// `get_events` stub that always panics.
pub struct PanickingEvents;

#[async_trait::async_trait]
impl Tool for PanickingEvents {
    fn kind(&self) -> ToolKind {
        ToolKind::GetEvents
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        panic!("calendar exploded");
    }
}
