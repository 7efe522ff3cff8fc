use std::path::PathBuf;
use std::time::Duration;

/// Policy for a keyword whose pipeline fails with an unrecoverable error
/// (a store write failure, not a fetch miss) inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Mark the task failed and stop processing the remaining keywords.
    /// Keywords already processed keep their stored rows.
    AbortBatch,
    /// Log the failure, record the keyword without a result and keep going.
    ContinueSiblings,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Domain substring a result link must contain to count as a hit.
    pub target_domain: String,
    /// Search endpoint the query string is appended to.
    pub search_base: String,
    /// Fixed `num=` result-count parameter on the search URL.
    pub result_count: u32,
    /// Directory holding one CSV series per normalized keyword.
    pub data_dir: PathBuf,
    /// Directory holding the raw-page archive, one HTML file per keyword.
    pub archive_dir: PathBuf,
    pub headless: bool,
    pub user_agent: String,
    /// Post-navigation settle delay bounds (uniform random within).
    pub settle_delay_min: Duration,
    pub settle_delay_max: Duration,
    /// Archived raw pages older than this are swept after each fetch.
    pub archive_retention: Duration,
    /// Bounded wait for the per-keyword append lock.
    pub lock_timeout: Duration,
    pub failure_mode: FailureMode,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target_domain: "web.com".to_string(),
            search_base: "https://www.google.com/search".to_string(),
            result_count: 20,
            data_dir: PathBuf::from("./ranking_data"),
            archive_dir: PathBuf::from("./search_results"),
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            settle_delay_min: Duration::from_secs(2),
            settle_delay_max: Duration::from_secs(5),
            archive_retention: Duration::from_secs(7 * 24 * 3600),
            lock_timeout: Duration::from_secs(5),
            failure_mode: FailureMode::AbortBatch,
        }
    }
}

impl TrackerConfig {
    pub fn new(target_domain: impl Into<String>) -> Self {
        Self {
            target_domain: target_domain.into(),
            ..Default::default()
        }
    }

    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    pub fn with_archive_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_dir = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_result_count(mut self, count: u32) -> Self {
        self.result_count = count;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, min: Duration, max: Duration) -> Self {
        self.settle_delay_min = min;
        self.settle_delay_max = max;
        self
    }

    pub fn with_archive_retention(mut self, retention: Duration) -> Self {
        self.archive_retention = retention;
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }
}
