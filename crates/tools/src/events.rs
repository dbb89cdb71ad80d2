//! Duke events calendar lookup.
//!
//! Fetches the public calendar feed for the next `future_days` days and keeps
//! the events whose title, description or categories mention a query term.

use advisor_core::error::ToolError;
use advisor_core::tool::{Tool, ToolKind, ToolResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::required_str;

const DESCRIPTION_LIMIT: usize = 150;
const MAX_FUTURE_DAYS: u64 = 365;

/// Words too short to discriminate between events.
const MIN_TERM_LEN: usize = 3;

#[derive(Debug, Deserialize)]
struct EventsFeed {
    #[serde(default)]
    events: Vec<FeedEvent>,
}

#[derive(Debug, Deserialize)]
struct FeedEvent {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_timestamp: Option<String>,
    #[serde(default)]
    location: Option<serde_json::Value>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    categories: Option<serde_json::Value>,
}

impl FeedEvent {
    /// Category names; the feed sends either strings or `{value: ...}` objects.
    fn category_names(&self) -> Vec<String> {
        let Some(serde_json::Value::Array(items)) = &self.categories else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|c| match c {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other["value"]
                    .as_str()
                    .or_else(|| other["name"].as_str())
                    .map(str::to_string),
            })
            .collect()
    }

    fn location(&self) -> String {
        match &self.location {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(loc) => loc["address"]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or("TBD")
                .to_string(),
            None => "TBD".into(),
        }
    }

    fn matches(&self, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let haystack = format!(
            "{} {} {}",
            self.summary.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default(),
            self.category_names().join(" ")
        )
        .to_lowercase();
        terms.iter().any(|t| {
            // Short terms only match whole words so `ai` skips "email"
            if t.chars().count() < MIN_TERM_LEN {
                haystack
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|w| w == t.as_str())
            } else {
                haystack.contains(t.as_str())
            }
        })
    }

    fn to_entry(&self) -> serde_json::Value {
        let description = self.description.as_deref().unwrap_or_default().trim();
        serde_json::json!({
            "title": self.summary.as_deref().unwrap_or("No Title"),
            "start": self.start_timestamp.as_deref().map(format_start).unwrap_or_default(),
            "location": self.location(),
            "link": self.link.as_deref().unwrap_or_default(),
            "description": truncate(description, DESCRIPTION_LIMIT),
        })
    }
}

/// `2025-04-01T18:00:00Z` → `Apr 01, 2025 06:00 PM`; other formats pass through.
fn format_start(ts: &str) -> String {
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%SZ")
        .map(|dt| dt.format("%b %d, %Y %I:%M %p").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Lowercased search terms: words of `MIN_TERM_LEN`+ characters plus
/// all-caps acronyms such as `AI`. Falls back to the whole query when no
/// word qualifies.
fn query_terms(query: &str) -> Vec<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_LEN || is_acronym(t))
        .map(str::to_lowercase)
        .collect();

    let query = query.trim();
    if terms.is_empty() && !query.is_empty() {
        return vec![query.to_lowercase()];
    }
    terms
}

fn is_acronym(word: &str) -> bool {
    word.chars().count() >= 2 && word.chars().all(|c| c.is_uppercase())
}

/// `get_events`
pub struct EventsTool {
    client: reqwest::Client,
    base_url: String,
    default_future_days: u32,
    max_results: usize,
}

impl EventsTool {
    pub fn new(base_url: &str, default_future_days: u32, max_results: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
            default_future_days,
            max_results: max_results.max(1),
        }
    }

    async fn fetch(&self, future_days: u64) -> Result<Vec<FeedEvent>, String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("future_days", future_days.to_string()),
                ("local", "true".into()),
                ("feed_type", "simple".into()),
            ])
            .send()
            .await
            .map_err(|e| format!("events request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("events feed returned HTTP {}", response.status().as_u16()));
        }

        let feed: EventsFeed = response
            .json()
            .await
            .map_err(|e| format!("could not parse events feed: {e}"))?;
        Ok(feed.events)
    }
}

#[async_trait]
impl Tool for EventsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GetEvents
    }

    fn description(&self) -> &str {
        "Get events from the Duke University Events API"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search for events"
                },
                "future_days": {
                    "type": "integer",
                    "description": "How many days ahead to look",
                    "default": self.default_future_days
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = required_str(&arguments, "query")?;
        let future_days = arguments["future_days"]
            .as_u64()
            .unwrap_or(self.default_future_days as u64)
            .clamp(1, MAX_FUTURE_DAYS);

        let events = match self.fetch(future_days).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Events lookup failed");
                return Ok(ToolResult::degraded(e));
            }
        };

        let terms = query_terms(query);
        let entries: Vec<serde_json::Value> = events
            .iter()
            .filter(|e| e.matches(&terms))
            .take(self.max_results)
            .map(FeedEvent::to_entry)
            .collect();

        debug!(fetched = events.len(), matched = entries.len(), "Events lookup");

        if entries.is_empty() {
            return Ok(ToolResult::degraded(format!(
                "no events found matching '{query}' in the next {future_days} days"
            )));
        }

        Ok(ToolResult::json(serde_json::Value::Array(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed() -> serde_json::Value {
        serde_json::json!({
            "events": [
                {
                    "summary": "AI Career Fair",
                    "description": "Meet employers hiring in machine learning.",
                    "start_timestamp": "2025-04-01T18:00:00Z",
                    "location": {"address": "Fitzpatrick Center"},
                    "link": "https://calendar.duke.edu/show?fq_id=1",
                    "categories": ["Career", "Engineering"]
                },
                {
                    "summary": "Chapel Concert",
                    "description": "",
                    "start_timestamp": "2025-04-02T23:00:00Z",
                    "location": {"address": ""},
                    "categories": [{"value": "Music"}]
                },
                {
                    "summary": "Resume Workshop",
                    "description": "Bring your resume.",
                    "start_timestamp": "not a timestamp",
                    "categories": [{"value": "Career"}]
                }
            ]
        })
    }

    #[test]
    fn start_time_is_humanized() {
        assert_eq!(format_start("2025-04-01T18:00:00Z"), "Apr 01, 2025 06:00 PM");
        assert_eq!(format_start("tomorrow"), "tomorrow");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 150), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn query_terms_keep_acronyms_and_drop_short_words() {
        assert_eq!(
            query_terms("AI career on campus"),
            vec!["ai", "career", "campus"]
        );
        assert_eq!(query_terms("é é"), vec!["é é"]);
        assert!(query_terms("  ").is_empty());
    }

    #[test]
    fn term_length_counts_characters() {
        // Two characters, four bytes
        assert_eq!(query_terms("éé fair"), vec!["fair"]);
        assert_eq!(query_terms("ééé fair"), vec!["ééé", "fair"]);
    }

    #[tokio::test]
    async fn acronym_query_matches_only_events_that_mention_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed()))
            .mount(&server)
            .await;

        let tool = EventsTool::new(&server.uri(), 30, 10);
        let result = tool
            .execute(serde_json::json!({"query": "AI"}))
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        let entries = data.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["title"], "AI Career Fair");
    }

    #[tokio::test]
    async fn filters_by_query_terms() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events/index.json"))
            .and(query_param("future_days", "30"))
            .and(query_param("local", "true"))
            .and(query_param("feed_type", "simple"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed()))
            .mount(&server)
            .await;

        let tool = EventsTool::new(&format!("{}/events/index.json", server.uri()), 30, 10);
        let result = tool
            .execute(serde_json::json!({"query": "career events"}))
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        let entries = data.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["title"], "AI Career Fair");
        assert_eq!(entries[0]["start"], "Apr 01, 2025 06:00 PM");
        assert_eq!(entries[0]["location"], "Fitzpatrick Center");
        assert_eq!(entries[1]["title"], "Resume Workshop");
        assert_eq!(entries[1]["location"], "TBD");
        assert_eq!(entries[1]["start"], "not a timestamp");
    }

    #[tokio::test]
    async fn honors_future_days_and_max_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("future_days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed()))
            .mount(&server)
            .await;

        let tool = EventsTool::new(&server.uri(), 30, 1);
        let result = tool
            .execute(serde_json::json!({"query": "career", "future_days": 7}))
            .await
            .unwrap();
        assert_eq!(result.data.unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_matches_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed()))
            .mount(&server)
            .await;

        let tool = EventsTool::new(&server.uri(), 30, 10);
        let result = tool
            .execute(serde_json::json!({"query": "basketball"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("no events found matching 'basketball'"));
    }

    #[tokio::test]
    async fn server_error_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tool = EventsTool::new(&server.uri(), 30, 10);
        let result = tool
            .execute(serde_json::json!({"query": "career"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = EventsTool::new("http://localhost", 30, 10);
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
