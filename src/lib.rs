//! Keyword rank tracker
//!
//! - Drives a headless Chromium session to capture a rendered results page
//!   per keyword and extracts the target domain's 1-indexed rank
//! - Persists an append-only CSV time series per keyword, safe under
//!   concurrent writers, with history/aggregate/export readers
//! - Runs keyword batches sequentially in background tasks with a polling
//!   status registry
//! - Summarizes a keyword's trend through a local text-generation endpoint
//!
//! # Single lookup
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rank_tracker::{LookupRequest, PageFetcher, RankService, RankStore, TrackerConfig};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TrackerConfig::new("web.com");
//!     let store = Arc::new(RankStore::new(&config).unwrap());
//!     let fetcher = Arc::new(PageFetcher::new(config.clone()));
//!
//!     let mut service = RankService::new(fetcher, store, &config.target_domain);
//!     let result = service.call(LookupRequest::new("laravel development")).await.unwrap();
//!     println!("Rank: {:?}", result.hit);
//! }
//! ```
//!
//! # Batch tracking
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rank_tracker::{PageFetcher, RankStore, TaskRegistry, TrackerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TrackerConfig::new("web.com");
//!     let store = Arc::new(RankStore::new(&config).unwrap());
//!     let fetcher = Arc::new(PageFetcher::new(config.clone()));
//!
//!     let registry = TaskRegistry::new(fetcher, store, &config);
//!     let id = registry.submit(vec!["laravel development".into(), "nuxt development".into()]);
//!
//!     // Poll until the batch finishes.
//!     let task = registry.status(&id).unwrap();
//!     println!("{}/{} done, status {:?}", task.progress, task.total, task.status);
//! }
//! ```

pub mod analyze;
pub mod batch;
pub mod config;
pub mod csv;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

// Re-export the primary types
pub use analyze::{AnalysisClient, AnalysisReport, ChunkAnalysis, RetryPolicy};
pub use batch::TaskRegistry;
pub use config::{FailureMode, TrackerConfig};
pub use error::TrackerError;
pub use extract::extract_rank;
pub use fetch::PageFetcher;
pub use service::{LookupRequest, LookupResult, RankService};
pub use store::{ChartSeries, DashboardSummary, RankStore};
pub use traits::Fetcher;
pub use types::{BatchStatus, BatchTask, Rank, RankHit, RankRecord};
