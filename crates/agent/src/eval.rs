//! Answer-quality evaluation with a judge model.
//!
//! Each question/answer pair is sent to a judge model that rates whether the
//! question concerns Duke, how clear the answer is (1-5), and comments on it.
//! Transient provider failures are retried with exponential backoff; replies
//! that are not the requested JSON are read heuristically.

use std::sync::Arc;
use std::time::Duration;

use advisor_config::EvalConfig;
use advisor_core::message::Message;
use advisor_core::provider::{Provider, ProviderRequest, ToolChoice};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Longest comment kept from a free-form reply.
const COMMENT_LIMIT: usize = 1000;

/// Clarity assumed when a free-form reply does not state one.
const DEFAULT_CLARITY: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    Yes,
    No,
    Unclear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub relevant: Relevance,
    /// 1-5; 0 when the pair could not be evaluated
    pub clarity: u8,
    pub comments: String,
}

impl Judgement {
    fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            relevant: Relevance::Unclear,
            clarity: 0,
            comments: format!("Failed to evaluate: {reason}"),
        }
    }
}

/// One row of the evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    pub question: String,
    pub answer: String,
    #[serde(flatten)]
    pub judgement: Judgement,
}

pub struct Evaluator {
    provider: Arc<dyn Provider>,
    model: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Evaluator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &EvalConfig) -> Self {
        Self::new(provider, &config.model)
            .with_retries(config.max_retries, Duration::from_secs(config.retry_delay_secs))
    }

    /// `attempts` total tries (at least 1); `delay` doubles after each failure.
    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.max_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Judge a single pair. Never fails: exhausted retries yield a `clarity = 0` judgement.
    pub async fn judge(&self, case: &EvalCase) -> Judgement {
        let mut delay = self.retry_delay;

        for attempt in 1..=self.max_attempts {
            let request = ProviderRequest {
                model: self.model.clone(),
                messages: vec![Message::user(judge_prompt(case))],
                temperature: 0.0,
                max_tokens: None,
                tools: Vec::new(),
                tool_choice: ToolChoice::None,
            };

            match self.provider.complete(request).await {
                Ok(response) => return parse_judgement(response.message.text()),
                Err(e) if attempt < self.max_attempts => {
                    warn!(attempt, error = %e, retry_in_secs = delay.as_secs_f32(), "Judge call failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Judge call failed, giving up");
                    return Judgement::failed(e);
                }
            }
        }

        Judgement::failed("no attempts made")
    }

    /// Judge every case in order.
    pub async fn evaluate_all(&self, cases: &[EvalCase]) -> Vec<EvalRecord> {
        let mut records = Vec::with_capacity(cases.len());
        for (i, case) in cases.iter().enumerate() {
            info!(
                pair = i + 1,
                total = cases.len(),
                question = %case.question.chars().take(50).collect::<String>(),
                "Evaluating pair"
            );
            records.push(EvalRecord {
                question: case.question.clone(),
                answer: case.answer.clone(),
                judgement: self.judge(case).await,
            });
        }
        records
    }
}

fn judge_prompt(case: &EvalCase) -> String {
    format!(
        r#"Evaluate the following question-answer pair about Duke University:

Question: {question}
Answer: {answer}

Please provide the following assessments:
1. Is this question relevant to Duke University? Answer with 'yes' or 'no'.
2. On a scale of 1-5 (where 1 is poor and 5 is excellent), rate the clarity of the answer.
3. Provide general comments on the answer's accuracy, completeness, and helpfulness.

Format your response as a JSON with the following structure:
{{
    "relevant": "yes/no",
    "clarity": "1-5",
    "comments": "Your comments here"
}}"#,
        question = case.question,
        answer = case.answer
    )
}

/// Read a judge reply: the embedded JSON object when it has all three fields,
/// otherwise keyword heuristics over the raw text.
pub fn parse_judgement(reply: &str) -> Judgement {
    parse_json_judgement(reply).unwrap_or_else(|| heuristic_judgement(reply))
}

fn parse_json_judgement(reply: &str) -> Option<Judgement> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&reply[start..=end]).ok()?;

    let relevant = match &value["relevant"] {
        serde_json::Value::Bool(true) => Relevance::Yes,
        serde_json::Value::Bool(false) => Relevance::No,
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "yes" => Relevance::Yes,
            "no" => Relevance::No,
            _ => Relevance::Unclear,
        },
        _ => return None,
    };

    let clarity = match &value["clarity"] {
        serde_json::Value::Number(n) => n.as_u64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    let comments = value["comments"].as_str()?.to_string();

    Some(Judgement {
        relevant,
        clarity: clarity.min(5) as u8,
        comments,
    })
}

fn heuristic_judgement(reply: &str) -> Judgement {
    let lower = reply.to_lowercase();

    let relevant = if !lower.contains("relevant") {
        Relevance::Unclear
    } else if lower.contains("yes") && !lower.contains("no") {
        Relevance::Yes
    } else if lower.contains("no") {
        Relevance::No
    } else {
        Relevance::Unclear
    };

    let clarity = (1..=5u8)
        .find(|i| {
            lower.contains(&format!("clarity: {i}")) || lower.contains(&format!("clarity rating: {i}"))
        })
        .unwrap_or(DEFAULT_CLARITY);

    Judgement {
        relevant,
        clarity,
        comments: reply.chars().take(COMMENT_LIMIT).collect(),
    }
}
