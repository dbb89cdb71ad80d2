//! Tool trait and the static tool registry.
//!
//! Tools are the lookups the model can ask for before answering:
//! handbook search, the course catalog, and the events calendar.
//! The set of tool identifiers is closed ([`ToolKind`]); the registry maps
//! each identifier to one typed handler and is never mutated once built.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Every tool the assistant knows about, in descriptor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    MemSearch,
    PrattSearch,
    GetCourses,
    GetCourseDetails,
    DescribeCourseByTitleOrCode,
    GetEvents,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::MemSearch,
        ToolKind::PrattSearch,
        ToolKind::GetCourses,
        ToolKind::GetCourseDetails,
        ToolKind::DescribeCourseByTitleOrCode,
        ToolKind::GetEvents,
    ];

    /// The wire name the model uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::MemSearch => "mem_search",
            ToolKind::PrattSearch => "pratt_search",
            ToolKind::GetCourses => "get_courses",
            ToolKind::GetCourseDetails => "get_course_details",
            ToolKind::DescribeCourseByTitleOrCode => "describe_course_by_title_or_code",
            ToolKind::GetEvents => "get_events",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the lookup produced real data (false for degraded, error-describing output)
    pub success: bool,

    /// The textual output placed into the conversation
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// A successful result carrying structured data, rendered as pretty JSON.
    pub fn json(data: serde_json::Value) -> Self {
        let output = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
        Self {
            success: true,
            output,
            data: Some(data),
        }
    }

    /// A successful plain-text result.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// A degraded result: the tool ran but could not produce data.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: format!("Error: {}", message.into()),
            data: None,
        }
    }
}

/// The core Tool trait.
///
/// Each lookup implements this trait and is registered under its [`ToolKind`].
/// `execute` receives the decoded keyword arguments as a JSON object.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which identifier this tool answers to.
    fn kind(&self) -> ToolKind;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().as_str().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The dispatch table from tool identifier to handler.
///
/// The loop uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Resolve a requested name to its handler
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool of the same kind.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    /// Builder-style [`ToolRegistry::register`].
    pub fn with(mut self, tool: Box<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Resolve a model-supplied name to its handler.
    ///
    /// Names outside [`ToolKind`] and kinds that were never registered both
    /// yield [`ToolError::NotFound`].
    pub fn resolve(&self, name: &str) -> Result<&dyn Tool, ToolError> {
        let kind: ToolKind = name.parse()?;
        self.tools
            .get(&kind)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// All tool definitions, in [`ToolKind`] order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Resolve and execute in one step.
    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        self.resolve(name)?.execute(arguments).await
    }

    /// List all registered tool kinds.
    pub fn kinds(&self) -> Vec<ToolKind> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the subject back.
    struct EchoCourses;

    #[async_trait]
    impl Tool for EchoCourses {
        fn kind(&self) -> ToolKind {
            ToolKind::GetCourses
        }
        fn description(&self) -> &str {
            "Echoes back the subject"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string" }
                },
                "required": ["subject"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            let subject = arguments["subject"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("missing subject".into()))?;
            Ok(ToolResult::text(subject))
        }
    }

    struct Events;

    #[async_trait]
    impl Tool for Events {
        fn kind(&self) -> ToolKind {
            ToolKind::GetEvents
        }
        fn description(&self) -> &str {
            "events"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}, "required": []})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text("none"))
        }
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.as_str().parse::<ToolKind>().unwrap(), kind);
        }
        assert!(matches!(
            "does_not_exist".parse::<ToolKind>(),
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn registry_resolve() {
        let registry = ToolRegistry::new().with(Box::new(EchoCourses));
        assert!(registry.resolve("get_courses").is_ok());
        // Known kind, not registered
        assert!(matches!(
            registry.resolve("get_events"),
            Err(ToolError::NotFound(name)) if name == "get_events"
        ));
        assert!(matches!(
            registry.resolve("does_not_exist"),
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn definitions_follow_kind_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Events));
        registry.register(Box::new(EchoCourses));
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["get_courses", "get_events"]);
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let registry = ToolRegistry::new().with(Box::new(EchoCourses));
        let result = registry
            .execute("get_courses", serde_json::json!({"subject": "AIPI"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "AIPI");
    }

    #[test]
    fn degraded_result_is_marked() {
        let r = ToolResult::degraded("catalog unavailable");
        assert!(!r.success);
        assert!(r.output.starts_with("Error:"));
    }
}
