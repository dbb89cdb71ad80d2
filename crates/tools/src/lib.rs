//! Tool implementations for the campus advisor.
//!
//! Tools give the model read-only access to university data:
//! the MEM and Pratt handbooks (semantic search over a local index),
//! the Duke course catalog, and the Duke events calendar.
//!
//! Every tool degrades to an error-describing output when its backend is
//! unreachable; only missing required arguments surface as `ToolError`.

pub mod catalog;
pub mod events;
pub mod handbook;

use std::sync::Arc;

use advisor_config::AppConfig;
use advisor_core::error::ToolError;
use advisor_core::provider::Provider;
use advisor_core::tool::ToolRegistry;
use tracing::warn;

pub use catalog::{
    CourseCatalog, CourseSummary, DescribeCourseTool, GetCourseDetailsTool, GetCoursesTool,
};
pub use events::EventsTool;
pub use handbook::{Handbook, HandbookIndex, HandbookSearchTool, IndexError};

/// Build the registry with every tool, wired from configuration.
///
/// `embedder` serves the handbook searches' query embeddings. A handbook
/// whose index is unset or unreadable is still registered and answers with
/// a degraded result.
pub fn build_registry(config: &AppConfig, embedder: Arc<dyn Provider>) -> ToolRegistry {
    let handbooks = &config.tools.handbooks;
    let catalog = Arc::new(CourseCatalog::new(
        &config.tools.catalog.base_url,
        config.tools.catalog.api_key.clone(),
    ));

    let mut registry = ToolRegistry::new();
    for handbook in [Handbook::Mem, Handbook::Pratt] {
        let path = match handbook {
            Handbook::Mem => handbooks.mem_index.as_ref(),
            Handbook::Pratt => handbooks.pratt_index.as_ref(),
        };
        let index = path.and_then(|p| match HandbookIndex::load(p) {
            Ok(index) => Some(Arc::new(index)),
            Err(e) => {
                warn!(handbook = handbook.label(), path = %p.display(), error = %e, "Handbook index unavailable");
                None
            }
        });
        registry.register(Box::new(
            HandbookSearchTool::new(handbook, embedder.clone(), index)
                .with_default_top_k(handbooks.top_k),
        ));
    }

    registry.register(Box::new(GetCoursesTool::new(catalog.clone())));
    registry.register(Box::new(GetCourseDetailsTool::new(catalog.clone())));
    registry.register(Box::new(DescribeCourseTool::new(catalog)));
    registry.register(Box::new(EventsTool::new(
        &config.tools.events.base_url,
        config.tools.events.future_days,
        config.tools.events.max_results,
    )));
    registry
}

/// Extract a required string argument.
pub(crate) fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

/// Extract a string-or-number argument as a string (ids are sometimes emitted as numbers).
pub(crate) fn required_id(arguments: &serde_json::Value, key: &str) -> Result<String, ToolError> {
    match &arguments[key] {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => required_str(arguments, key).map(|s| s.trim().to_string()),
    }
}
