//! The tool orchestration loop.
//!
//! One turn alternates between the model and the tools:
//!
//! 1. **Ask** the model, offering every tool (`tool_choice = auto`)
//! 2. **If a tool is requested**: run the first request only, append the
//!    assistant call and the tool result together, and ask again
//! 3. **If the model answers in text**: append that answer and return it
//!
//! Each gateway call is one round. A turn that is still requesting tools
//! after `max_rounds` rounds fails with `RoundLimitExceeded`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use advisor_core::error::TurnError;
use advisor_core::message::{Conversation, Message, MessageToolCall};
use advisor_core::provider::ToolChoice;
use advisor_core::tool::ToolRegistry;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::gateway::ChatGateway;
use crate::progress::{Progress, ProgressEvent, ProgressSender};

/// Rounds allowed per turn unless configured otherwise.
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

pub struct ToolLoop {
    gateway: ChatGateway,
    tools: Arc<ToolRegistry>,
    max_rounds: u32,
}

impl ToolLoop {
    pub fn new(gateway: ChatGateway, tools: Arc<ToolRegistry>) -> Self {
        Self {
            gateway,
            tools,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the round cap (at least 1).
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run one turn over `conversation`, whose last message is the user's.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String, TurnError> {
        self.run_with_progress(conversation, None).await
    }

    /// [`ToolLoop::run`], reporting progress on `progress` when given.
    pub async fn run_with_progress(
        &self,
        conversation: &mut Conversation,
        progress: Option<ProgressSender>,
    ) -> Result<String, TurnError> {
        let progress = Progress::new(progress);
        let result = self.drive(conversation, &progress).await;

        match &result {
            Ok(answer) => info!(
                conversation_id = %conversation.id,
                messages = conversation.len(),
                answer_len = answer.len(),
                "Turn complete"
            ),
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Turn failed");
                progress.emit(ProgressEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        result
    }

    async fn drive(
        &self,
        conversation: &mut Conversation,
        progress: &Progress,
    ) -> Result<String, TurnError> {
        let definitions = self.tools.definitions();

        for round in 1..=self.max_rounds {
            progress.emit(ProgressEvent::AwaitingModel { round });
            debug!(
                conversation_id = %conversation.id,
                round,
                max_rounds = self.max_rounds,
                "Tool loop round"
            );

            let mut message = self
                .gateway
                .complete(conversation.messages(), Some(&definitions), ToolChoice::Auto)
                .await
                .ok_or(TurnError::NoResponse)?;

            let mut requested = std::mem::take(&mut message.tool_calls).into_iter();
            let Some(call) = requested.next() else {
                progress.emit(ProgressEvent::GeneratingResponse);
                let answer = message.text().to_string();
                conversation.push(message);
                return Ok(answer);
            };

            let discarded = requested.count();
            if discarded > 0 {
                warn!(
                    tool = %call.name,
                    discarded,
                    "Model requested several tool calls; running only the first"
                );
            }

            let output = self.execute(&call, progress).await?;

            let call_id = call.id.clone();
            conversation.push(Message::assistant_tool_call(call));
            conversation.push(Message::tool_result(call_id, output));
        }

        Err(TurnError::RoundLimitExceeded {
            max_rounds: self.max_rounds,
        })
    }

    /// Decode, resolve and run one tool call, returning its textual output.
    async fn execute(&self, call: &MessageToolCall, progress: &Progress) -> Result<String, TurnError> {
        progress.emit(ProgressEvent::ResolvingTool {
            name: call.name.clone(),
        });

        let arguments =
            decode_arguments(&call.arguments).map_err(|reason| TurnError::MalformedArguments {
                tool: call.name.clone(),
                reason,
            })?;

        let tool = self
            .tools
            .resolve(&call.name)
            .map_err(|_| TurnError::UnknownTool(call.name.clone()))?;

        progress.emit(ProgressEvent::ExecutingTool {
            name: call.name.clone(),
        });
        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        let outcome = AssertUnwindSafe(tool.execute(arguments))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(panic_reason(payload.as_ref())),
        };

        progress.emit(ProgressEvent::ToolFinished {
            name: call.name.clone(),
            success: matches!(&result, Ok(r) if r.success),
        });

        match result {
            Ok(result) => {
                if !result.success {
                    debug!(tool = %call.name, output = %result.output, "Tool degraded");
                }
                Ok(result.output)
            }
            Err(reason) => {
                warn!(tool = %call.name, reason = %reason, "Tool execution failed");
                Err(TurnError::ToolFailed {
                    tool: call.name.clone(),
                    reason,
                })
            }
        }
    }
}

/// Decode a model-emitted argument string into a JSON object.
///
/// An empty payload means no arguments.
fn decode_arguments(raw: &str) -> Result<serde_json::Value, String> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }

    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, got `{raw}`"));
    }
    Ok(value)
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".into()
    }
}
