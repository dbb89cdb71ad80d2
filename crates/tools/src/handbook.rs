//! Handbook search over a local embedding index.
//!
//! An index is built once from the handbook text (one chunk per page) with
//! `advisor index`, then loaded at startup. Queries are embedded with the
//! same model the index was built with and ranked by cosine similarity.

use std::path::Path;
use std::sync::Arc;

use advisor_core::error::{ProviderError, ToolError};
use advisor_core::provider::{EmbeddingRequest, Provider};
use advisor_core::tool::{Tool, ToolKind, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::required_str;

/// Pages embedded per request.
const EMBED_BATCH_SIZE: usize = 100;

/// Upper bound on results per search.
const MAX_TOP_K: usize = 10;

/// Errors building, reading or writing a handbook index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Provider returned {got} embeddings for {expected} pages")]
    CountMismatch { expected: usize, got: usize },
}

/// Which handbook a search tool covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handbook {
    /// Master of Engineering Management
    Mem,
    /// Pratt School of Engineering
    Pratt,
}

impl Handbook {
    pub fn kind(&self) -> ToolKind {
        match self {
            Handbook::Mem => ToolKind::MemSearch,
            Handbook::Pratt => ToolKind::PrattSearch,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Handbook::Mem => "mem",
            Handbook::Pratt => "pratt",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Handbook::Mem => {
                "Search for information about the MEM (Master of Engineering Management) program at Duke University"
            }
            Handbook::Pratt => {
                "Search for information about Pratt School of Engineering programs at Duke University"
            }
        }
    }

    fn topic(&self) -> &'static str {
        match self {
            Handbook::Mem => "MEM program",
            Handbook::Pratt => "Pratt programs",
        }
    }
}

impl std::str::FromStr for Handbook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mem" => Ok(Handbook::Mem),
            "pratt" => Ok(Handbook::Pratt),
            other => Err(format!("unknown handbook '{other}' (expected mem or pratt)")),
        }
    }
}

/// One embedded page of a handbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexChunk {
    pub id: String,
    /// File the page came from
    pub source: String,
    /// 1-based page number within `source`
    pub page: u32,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A persisted handbook index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandbookIndex {
    /// Embedding model the chunks were built with; queries must use the same one
    pub model: String,
    #[serde(default)]
    pub chunks: Vec<IndexChunk>,
}

impl HandbookIndex {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            chunks: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path)?;
        let index: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), chunks = index.chunks.len(), "Loaded handbook index");
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Embed every non-empty page of `text` and append the chunks.
    ///
    /// Pages are separated by form feeds. Returns the number of chunks added.
    pub async fn add_document(
        &mut self,
        embedder: &dyn Provider,
        handbook: Handbook,
        source: &str,
        text: &str,
    ) -> Result<usize, IndexError> {
        let pages = split_pages(text);
        let mut added = 0;

        for batch in pages.chunks(EMBED_BATCH_SIZE) {
            let response = embedder
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.iter().map(|(_, t)| t.clone()).collect(),
                })
                .await?;

            if response.embeddings.len() != batch.len() {
                return Err(IndexError::CountMismatch {
                    expected: batch.len(),
                    got: response.embeddings.len(),
                });
            }

            for ((page, text), embedding) in batch.iter().zip(response.embeddings) {
                self.chunks.push(IndexChunk {
                    id: format!("{}-{source}-page{page}", handbook.label()),
                    source: source.to_string(),
                    page: *page,
                    text: text.clone(),
                    embedding,
                });
                added += 1;
            }
        }

        info!(source, pages = added, "Indexed handbook document");
        Ok(added)
    }

    /// The `top_k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(&IndexChunk, f32)> {
        let mut scored: Vec<(&IndexChunk, f32)> = self
            .chunks
            .iter()
            .map(|c| (c, cosine_similarity(query, &c.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Split on form feeds, keeping 1-based page numbers of the non-empty pages.
fn split_pages(text: &str) -> Vec<(u32, String)> {
    text.split('\x0c')
        .enumerate()
        .filter_map(|(i, page)| {
            let page_text = page.trim();
            (!page_text.is_empty()).then(|| (i as u32 + 1, page_text.to_string()))
        })
        .collect()
}

/// Cosine similarity between two vectors; 0.0 for mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// `mem_search` / `pratt_search`.
pub struct HandbookSearchTool {
    handbook: Handbook,
    embedder: Arc<dyn Provider>,
    index: Option<Arc<HandbookIndex>>,
    default_top_k: usize,
}

impl HandbookSearchTool {
    pub fn new(
        handbook: Handbook,
        embedder: Arc<dyn Provider>,
        index: Option<Arc<HandbookIndex>>,
    ) -> Self {
        Self {
            handbook,
            embedder,
            index,
            default_top_k: 3,
        }
    }

    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k.clamp(1, MAX_TOP_K);
        self
    }
}

#[async_trait]
impl Tool for HandbookSearchTool {
    fn kind(&self) -> ToolKind {
        self.handbook.kind()
    }

    fn description(&self) -> &str {
        self.handbook.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": format!("The search query about {}", self.handbook.topic())
                },
                "top_k": {
                    "type": "integer",
                    "description": "Number of results to return",
                    "default": self.default_top_k
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = required_str(&arguments, "query")?;
        let top_k = arguments["top_k"]
            .as_u64()
            .map(|k| k as usize)
            .unwrap_or(self.default_top_k)
            .clamp(1, MAX_TOP_K);

        let Some(index) = &self.index else {
            return Ok(ToolResult::degraded(format!(
                "the {} handbook index is not available",
                self.handbook.label()
            )));
        };

        let response = match self
            .embedder
            .embed(EmbeddingRequest {
                model: index.model.clone(),
                inputs: vec![query.to_string()],
            })
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::degraded(format!("could not embed query: {e}"))),
        };

        let Some(query_embedding) = response.embeddings.first() else {
            return Ok(ToolResult::degraded("embedding provider returned no vectors"));
        };

        let hits = index.search(query_embedding, top_k);
        if hits.is_empty() {
            return Ok(ToolResult::degraded(format!(
                "no {} handbook passages found",
                self.handbook.label()
            )));
        }

        debug!(handbook = self.handbook.label(), hits = hits.len(), "Handbook search");

        let results: Vec<serde_json::Value> = hits
            .into_iter()
            .map(|(chunk, score)| {
                serde_json::json!({
                    "source": chunk.source,
                    "page": chunk.page,
                    "score": (score * 1000.0).round() / 1000.0,
                    "text": chunk.text,
                })
            })
            .collect();

        Ok(ToolResult::json(serde_json::Value::Array(results)))
    }
}
