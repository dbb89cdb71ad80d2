//! Duke course catalog lookups (`streamer.oit.duke.edu` curriculum API).

use std::sync::Arc;

use advisor_core::error::ToolError;
use advisor_core::tool::{Tool, ToolKind, ToolResult};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{required_id, required_str};

/// Why a catalog request produced no data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid catalog URL: {0}")]
    Url(String),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned HTTP {0}")]
    Status(u16),
}

/// A course as listed under a subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub crse_id: String,
    pub crse_offer_nbr: String,
    pub subject: String,
    pub catalog_nbr: String,
    pub title: String,
}

impl CourseSummary {
    /// `"AIPI 520"` style code.
    pub fn code(&self) -> String {
        format!("{} {}", self.subject, self.catalog_nbr)
    }

    fn from_json(value: &serde_json::Value) -> Option<Self> {
        let field = |key: &str| -> Option<String> {
            match &value[key] {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };
        Some(Self {
            crse_id: field("crse_id")?,
            crse_offer_nbr: field("crse_offer_nbr").unwrap_or_else(|| "1".into()),
            subject: field("subject").unwrap_or_default(),
            catalog_nbr: field("catalog_nbr").unwrap_or_default(),
            title: field("course_title_long")
                .or_else(|| field("descr"))
                .unwrap_or_default(),
        })
    }
}

/// HTTP client for the curriculum endpoints.
pub struct CourseCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CourseCatalog {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// `{base}/curriculum/<segments...>?access_token=...`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| CatalogError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .push("curriculum")
            .extend(segments);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("access_token", key);
        }
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, CatalogError> {
        debug!(path = url.path(), "Catalog request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Courses offered under a subject (e.g. `"AIPI - AI for Product Innovation"`).
    pub async fn courses(&self, subject: &str) -> Result<Vec<CourseSummary>, CatalogError> {
        let url = self.url(&["courses", "subject", subject])?;
        let body = self.get_json(url).await?;
        Ok(extract_summaries(&body))
    }

    /// Full offering details for one course.
    pub async fn course_details(
        &self,
        crse_id: &str,
        crse_offer_nbr: &str,
    ) -> Result<serde_json::Value, CatalogError> {
        let url = self.url(&["courses", "crse_id", crse_id, "crse_offer_nbr", crse_offer_nbr])?;
        self.get_json(url).await
    }
}

/// Collect every `course_summary` entry, wherever the response nests it.
///
/// The API returns a bare object instead of a one-element array when a
/// subject has a single course.
fn extract_summaries(body: &serde_json::Value) -> Vec<CourseSummary> {
    let mut out = Vec::new();
    collect_summaries(body, &mut out);
    out
}

fn collect_summaries(value: &serde_json::Value, out: &mut Vec<CourseSummary>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                if key == "course_summary" {
                    match child {
                        serde_json::Value::Array(items) => {
                            out.extend(items.iter().filter_map(CourseSummary::from_json));
                        }
                        obj @ serde_json::Value::Object(_) => {
                            out.extend(CourseSummary::from_json(obj));
                        }
                        _ => {}
                    }
                } else {
                    collect_summaries(child, out);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_summaries(item, out);
            }
        }
        _ => {}
    }
}

/// Pick the course whose code or title matches `query`.
///
/// Exact catalog number or `"SUBJ NBR"` code wins over a title substring.
fn find_course<'a>(courses: &'a [CourseSummary], query: &str) -> Option<&'a CourseSummary> {
    let needle = normalize(query);
    if needle.is_empty() {
        return None;
    }

    courses
        .iter()
        .find(|c| normalize(&c.catalog_nbr) == needle || normalize(&c.code()) == needle)
        .or_else(|| courses.iter().find(|c| normalize(&c.title) == needle))
        .or_else(|| {
            courses
                .iter()
                .find(|c| normalize(&c.title).contains(&needle))
        })
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn summaries_json(courses: &[CourseSummary]) -> serde_json::Value {
    serde_json::Value::Array(
        courses
            .iter()
            .map(|c| {
                serde_json::json!({
                    "code": c.code(),
                    "title": c.title,
                    "crse_id": c.crse_id,
                    "crse_offer_nbr": c.crse_offer_nbr,
                })
            })
            .collect(),
    )
}

/// `get_courses`
pub struct GetCoursesTool {
    catalog: Arc<CourseCatalog>,
}

impl GetCoursesTool {
    pub fn new(catalog: Arc<CourseCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for GetCoursesTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GetCourses
    }

    fn description(&self) -> &str {
        "Get all courses for a given subject at Duke University"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "subject": {
                    "type": "string",
                    "description": "The subject code or name (e.g., 'AIPI', 'CS', 'ECE')"
                }
            },
            "required": ["subject"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let subject = required_str(&arguments, "subject")?.trim();

        match self.catalog.courses(subject).await {
            Ok(courses) if courses.is_empty() => Ok(ToolResult::degraded(format!(
                "no courses found for subject '{subject}'"
            ))),
            Ok(courses) => Ok(ToolResult::json(summaries_json(&courses))),
            Err(e) => {
                warn!(subject, error = %e, "Course listing failed");
                Ok(ToolResult::degraded(e.to_string()))
            }
        }
    }
}

/// `get_course_details`
pub struct GetCourseDetailsTool {
    catalog: Arc<CourseCatalog>,
}

impl GetCourseDetailsTool {
    pub fn new(catalog: Arc<CourseCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for GetCourseDetailsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GetCourseDetails
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific course at Duke University"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "crse_id": {
                    "type": "string",
                    "description": "The course ID"
                },
                "crse_offer_nbr": {
                    "type": "string",
                    "description": "The course offering number"
                }
            },
            "required": ["crse_id", "crse_offer_nbr"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let crse_id = required_id(&arguments, "crse_id")?;
        let offer_nbr = required_id(&arguments, "crse_offer_nbr")?;

        match self.catalog.course_details(&crse_id, &offer_nbr).await {
            Ok(details) => Ok(ToolResult::json(details)),
            Err(e) => {
                warn!(crse_id = %crse_id, error = %e, "Course details failed");
                Ok(ToolResult::degraded(e.to_string()))
            }
        }
    }
}

/// `describe_course_by_title_or_code`
pub struct DescribeCourseTool {
    catalog: Arc<CourseCatalog>,
}

impl DescribeCourseTool {
    pub fn new(catalog: Arc<CourseCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for DescribeCourseTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DescribeCourseByTitleOrCode
    }

    fn description(&self) -> &str {
        "Search for a course by its title or code and get detailed information"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "subject": {
                    "type": "string",
                    "description": "The subject code or name"
                },
                "query": {
                    "type": "string",
                    "description": "The course code or title to search for"
                }
            },
            "required": ["subject", "query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let subject = required_str(&arguments, "subject")?.trim();
        let query = required_str(&arguments, "query")?;

        let courses = match self.catalog.courses(subject).await {
            Ok(courses) => courses,
            Err(e) => {
                warn!(subject, error = %e, "Course listing failed");
                return Ok(ToolResult::degraded(e.to_string()));
            }
        };

        let Some(course) = find_course(&courses, query) else {
            return Ok(ToolResult::degraded(format!(
                "no course matching '{query}' in subject '{subject}'"
            )));
        };

        match self
            .catalog
            .course_details(&course.crse_id, &course.crse_offer_nbr)
            .await
        {
            Ok(details) => Ok(ToolResult::json(serde_json::json!({
                "code": course.code(),
                "title": course.title,
                "details": details,
            }))),
            Err(e) => {
                warn!(crse_id = %course.crse_id, error = %e, "Course details failed");
                Ok(ToolResult::degraded(e.to_string()))
            }
        }
    }
}
