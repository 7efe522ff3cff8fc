//! Trend analysis via a local text-generation endpoint.
//!
//! A keyword's history is summarized in fixed-size chunks; each chunk is
//! sent to the model with a fact-based analyst prompt. A chunk that fails
//! (after the retry policy is exhausted) records an inline error string and
//! never aborts the rest of the report.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::TrackerError;
use crate::store::RankStore;
use crate::types::RankRecord;

/// Rows per analysis chunk.
pub const ANALYSIS_CHUNK_ROWS: usize = 10;

const NO_RESPONSE_FALLBACK: &str = "No response from model.";

/// Retry policy for the generation call: bounded attempts with a fixed
/// backoff, retrying transport-level failures only. Application-level
/// error text from the model is returned as-is, never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// One chunk's commentary, or its inline error string.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkAnalysis {
    pub chunk: usize,
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub keyword: String,
    pub analyses: Vec<ChunkAnalysis>,
    pub total_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct AnalysisClient {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl AnalysisClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send one prompt to the generation endpoint, retrying per policy.
    pub async fn generate(&self, prompt: &str) -> Result<String, TrackerError> {
        let mut last_error = None;

        for attempt in 0..self.retry.max_attempts {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    warn!(
                        "Generation attempt {} failed, retrying in {:?}: {}",
                        attempt + 1,
                        self.retry.backoff,
                        e
                    );
                    sleep(self.retry.backoff).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(TrackerError::Analysis {
            attempts: self.retry.max_attempts,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "max retries exceeded".to_string()),
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, TrackerError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::AnalysisTransport(e.to_string()))?;

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            TrackerError::Analysis {
                attempts: 1,
                message: format!("invalid response body: {}", e),
            }
        })?;

        Ok(payload
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or(NO_RESPONSE_FALLBACK)
            .to_string())
    }

    /// Summarize a keyword's full history chunk by chunk.
    pub async fn analyze_keyword(&self, store: &RankStore, keyword: &str) -> AnalysisReport {
        let history = store.history(keyword);
        if history.is_empty() {
            warn!("No stored data for keyword: {}", keyword);
            return AnalysisReport {
                keyword: keyword.to_string(),
                analyses: Vec::new(),
                total_rows: 0,
                error: Some(format!("No data found for keyword: {}", keyword)),
            };
        }

        let mut analyses = Vec::new();
        for (index, chunk) in history.chunks(ANALYSIS_CHUNK_ROWS).enumerate() {
            let number = index + 1;
            let prompt = build_prompt(chunk);

            match self.generate(&prompt).await {
                Ok(text) => {
                    info!("Analyzed chunk {} for '{}'", number, keyword);
                    analyses.push(ChunkAnalysis {
                        chunk: number,
                        analysis: text,
                    });
                }
                Err(e) => {
                    warn!("Error analyzing chunk {} for '{}': {}", number, keyword, e);
                    analyses.push(ChunkAnalysis {
                        chunk: number,
                        analysis: format!("Error analyzing chunk: {}", e),
                    });
                }
            }
        }

        AnalysisReport {
            keyword: keyword.to_string(),
            analyses,
            total_rows: history.len(),
            error: None,
        }
    }
}

fn build_prompt(chunk: &[RankRecord]) -> String {
    let data = serde_json::to_string_pretty(chunk).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are a search ranking analyst. Analyze the following keyword trend data.\n\
         \n\
         Each record contains: timestamp, keyword, rank, title, and URL.\n\
         \n\
         Data:\n{data}\n\
         \n\
         Based on this data:\n\
         1. Identify if the rank is improving, declining, or stable.\n\
         2. Mention the highest and lowest ranks and the corresponding dates.\n\
         3. Point out if title or URL changed.\n\
         4. Keep it short, clear, and fact-based. Avoid guessing beyond the data.\n"
    )
}
