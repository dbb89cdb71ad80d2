//! Error types for the advisor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Terminal outcomes of one user exchange.
///
/// Every variant ends the turn. The session turns them into a user-visible
/// reply; none of them leaves a tool-call message without its result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The gateway returned no response (network, auth, or provider failure).
    #[error("the language model did not respond")]
    NoResponse,

    /// The model asked for a tool the registry does not know.
    #[error("the model requested an unknown tool: {0}")]
    UnknownTool(String),

    #[error("could not decode arguments for tool '{tool}': {reason}")]
    MalformedArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    #[error("the model kept requesting tools after {max_rounds} rounds")]
    RoundLimitExceeded { max_rounds: u32 },

    #[error("the request timed out after {secs}s")]
    TimedOut { secs: u64 },
}

impl TurnError {
    /// The message shown to the user when a turn fails.
    pub fn user_message(&self) -> String {
        match self {
            TurnError::NoResponse => {
                "Sorry, I couldn't reach the language model. Check your API key and try again."
                    .into()
            }
            TurnError::UnknownTool(_) | TurnError::MalformedArguments { .. } => {
                "Sorry, I could not complete the request: the assistant made an invalid lookup."
                    .into()
            }
            TurnError::ToolFailed { tool, .. } => {
                format!("Sorry, I could not complete the request: the '{tool}' lookup failed.")
            }
            TurnError::RoundLimitExceeded { .. } => {
                "Sorry, I could not complete the request: too many lookups were needed.".into()
            }
            TurnError::TimedOut { .. } => {
                "Sorry, I could not complete the request in time.".into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_tool_is_distinct_from_no_response() {
        let unknown = TurnError::UnknownTool("does_not_exist".into());
        assert_ne!(unknown, TurnError::NoResponse);
        assert!(unknown.to_string().contains("does_not_exist"));
        assert_ne!(unknown.user_message(), TurnError::NoResponse.user_message());
    }

    #[test]
    fn tool_failure_names_the_tool() {
        let err = TurnError::ToolFailed {
            tool: "get_events".into(),
            reason: "boom".into(),
        };
        assert!(err.user_message().contains("get_events"));
        assert!(!err.user_message().contains("boom"));
    }
}
