//! A chat session: one conversation, one turn at a time.

use std::sync::Arc;
use std::time::Duration;

use advisor_config::AppConfig;
use advisor_core::error::TurnError;
use advisor_core::message::{Conversation, ConversationId, Message};
use advisor_core::provider::Provider;
use advisor_core::tool::ToolRegistry;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::gateway::ChatGateway;
use crate::loop_runner::ToolLoop;
use crate::progress::{Progress, ProgressEvent, ProgressSender};

/// What the user sees after a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Set when the turn failed; `text` then holds the apology.
    pub error: Option<TurnError>,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Owns the conversation and serializes turns over it.
///
/// A second `ask` waits until the running turn finishes.
pub struct ChatSession {
    tool_loop: ToolLoop,
    conversation: Mutex<Conversation>,
    turn_timeout: Option<Duration>,
}

impl ChatSession {
    pub fn new(tool_loop: ToolLoop) -> Self {
        Self {
            tool_loop,
            conversation: Mutex::new(Conversation::new()),
            turn_timeout: None,
        }
    }

    /// Session wired from configuration (`turn_timeout_secs = 0` disables the timeout).
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        let tool_loop = ToolLoop::new(ChatGateway::from_config(provider, config), tools)
            .with_max_rounds(config.agent.max_rounds);
        let session = Self::new(tool_loop);
        match config.agent.turn_timeout_secs {
            0 => session,
            secs => session.with_turn_timeout(Duration::from_secs(secs)),
        }
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    pub fn tool_loop(&self) -> &ToolLoop {
        &self.tool_loop
    }

    pub async fn ask(&self, input: &str) -> Reply {
        self.ask_with_progress(input, None).await
    }

    /// Append the user's message, run one turn, and turn any failure into an apology.
    pub async fn ask_with_progress(&self, input: &str, progress: Option<ProgressSender>) -> Reply {
        let mut conversation = self.conversation.lock().await;
        conversation.push(Message::user(input));

        let result = match self.turn_timeout {
            None => {
                self.tool_loop
                    .run_with_progress(&mut conversation, progress)
                    .await
            }
            Some(limit) => {
                let notify = Progress::new(progress.clone());
                let turn = self.tool_loop.run_with_progress(&mut conversation, progress);
                match tokio::time::timeout(limit, turn).await {
                    Ok(result) => result,
                    Err(_) => {
                        let err = TurnError::TimedOut {
                            secs: limit.as_secs(),
                        };
                        notify.emit(ProgressEvent::Failed {
                            message: err.to_string(),
                        });
                        Err(err)
                    }
                }
            }
        };

        match result {
            Ok(text) => Reply { text, error: None },
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Replying with apology");
                Reply {
                    text: e.user_message(),
                    error: Some(e),
                }
            }
        }
    }

    /// Start over with an empty conversation.
    pub async fn reset(&self) -> ConversationId {
        let mut conversation = self.conversation.lock().await;
        conversation.reset();
        info!(conversation_id = %conversation.id, "Conversation reset");
        conversation.id.clone()
    }

    /// A copy of the conversation so far.
    pub async fn history(&self) -> Vec<Message> {
        self.conversation.lock().await.messages().to_vec()
    }
}
