use async_trait::async_trait;

use crate::error::TrackerError;

/// Source of rendered results pages. The production implementation drives a
/// headless browser; tests substitute canned markup.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the rendered results page for one query string.
    async fn fetch(&self, keyword: &str) -> Result<String, TrackerError>;
}
