//! # Advisor Core
//!
//! Domain types, traits, and error definitions for the campus advisor.
//! This crate has **no I/O dependencies** — it defines the domain model
//! that the provider, tool, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here (`Provider`, `Tool`). Implementations live in
//! their respective crates, so the orchestration loop can be exercised with
//! scripted mock providers and stub tools.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError, TurnError};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, ToolDefinition};
pub use tool::{Tool, ToolKind, ToolRegistry, ToolResult};
