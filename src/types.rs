//! Core data model: rank observations and batch task state.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Stored rank column value for an observation with no matching result.
pub const RANK_SENTINEL: &str = "Not found";
/// Stored title/url column value when no result was matched.
pub const FIELD_SENTINEL: &str = "N/A";
/// Title used when a result block carries a link but no heading.
pub const TITLE_PLACEHOLDER: &str = "No Title Found";
/// Second-precision timestamp format for series rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 1-indexed position of the target domain on a results page, or the
/// explicit not-found outcome. Stored and serialized as the position's
/// decimal string or the `"Not found"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Found(u32),
    NotFound,
}

impl Rank {
    pub fn position(&self) -> Option<u32> {
        match self {
            Rank::Found(n) => Some(*n),
            Rank::NotFound => None,
        }
    }

    pub fn as_store_value(&self) -> String {
        match self {
            Rank::Found(n) => n.to_string(),
            Rank::NotFound => RANK_SENTINEL.to_string(),
        }
    }

    /// Parses a stored rank column. Anything that is not a positive integer
    /// (the sentinel included) reads back as `NotFound`.
    pub fn parse(value: &str) -> Rank {
        value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .map(Rank::Found)
            .unwrap_or(Rank::NotFound)
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_store_value())
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Rank::parse(&value))
    }
}

/// A matched result block on the page: where it sat and what it linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankHit {
    pub rank: u32,
    pub title: String,
    pub url: String,
}

/// One stored observation in a keyword's series. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    pub timestamp: String,
    pub keyword: String,
    pub rank: Rank,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Running,
    Completed,
    Failed,
}

/// State of one submitted batch. Written only by the task running the batch;
/// pollers read snapshot clones.
#[derive(Debug, Clone, Serialize)]
pub struct BatchTask {
    pub id: Uuid,
    pub keywords: Vec<String>,
    pub total: usize,
    pub progress: usize,
    pub status: BatchStatus,
    /// Per-keyword partial results; `None` marks a not-found observation.
    pub results: HashMap<String, Option<RankHit>>,
    pub error: Option<String>,
}

impl BatchTask {
    pub fn new(id: Uuid, keywords: Vec<String>) -> Self {
        let total = keywords.len();
        Self {
            id,
            keywords,
            total,
            progress: 0,
            status: BatchStatus::Running,
            results: HashMap::new(),
            error: None,
        }
    }
}
