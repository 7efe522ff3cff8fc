//! Batch orchestration with a polling task registry.
//!
//! Each submitted batch runs in its own spawned task and processes its
//! keywords one at a time. Sequential processing within a batch is
//! deliberate: concurrent automated sessions against the same search
//! engine from one client trip anti-bot defenses. Separate batches run
//! independently of each other.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{FailureMode, TrackerConfig};
use crate::pipeline;
use crate::store::RankStore;
use crate::traits::Fetcher;
use crate::types::{BatchStatus, BatchTask};

/// Registry of submitted batches. Each task entry has exactly one writer
/// (the spawned batch loop); `status` hands pollers a snapshot clone.
/// Finished tasks stay in the map for the life of the process.
pub struct TaskRegistry {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<RankStore>,
    target_domain: String,
    failure_mode: FailureMode,
    tasks: Arc<DashMap<Uuid, BatchTask>>,
}

impl TaskRegistry {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<RankStore>, config: &TrackerConfig) -> Self {
        Self {
            fetcher,
            store,
            target_domain: config.target_domain.clone(),
            failure_mode: config.failure_mode,
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Submit a batch of keywords and return its task id. The batch runs in
    /// the background; submission never waits on it. Blank keywords are
    /// dropped before the batch starts.
    pub fn submit(&self, keywords: Vec<String>) -> Uuid {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        let id = Uuid::new_v4();
        self.tasks.insert(id, BatchTask::new(id, keywords.clone()));
        info!("Submitted batch {} with {} keywords", id, keywords.len());

        let tasks = Arc::clone(&self.tasks);
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let target_domain = self.target_domain.clone();
        let failure_mode = self.failure_mode;

        tokio::spawn(async move {
            run_batch(tasks, id, fetcher, store, target_domain, failure_mode, keywords).await;
        });

        id
    }

    /// Snapshot of one task's state, or `None` for an unknown id.
    pub fn status(&self, id: &Uuid) -> Option<BatchTask> {
        self.tasks.get(id).map(|task| task.clone())
    }
}

async fn run_batch(
    tasks: Arc<DashMap<Uuid, BatchTask>>,
    id: Uuid,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<RankStore>,
    target_domain: String,
    failure_mode: FailureMode,
    keywords: Vec<String>,
) {
    for keyword in &keywords {
        match pipeline::lookup(fetcher.as_ref(), store.as_ref(), &target_domain, keyword).await {
            Ok(hit) => {
                if let Some(mut task) = tasks.get_mut(&id) {
                    task.results.insert(keyword.clone(), hit);
                    task.progress += 1;
                }
                info!("Completed search for '{}' in task {}", keyword, id);
            }
            Err(e) => {
                error!("Error processing '{}' in task {}: {}", keyword, id, e);
                match failure_mode {
                    FailureMode::AbortBatch => {
                        if let Some(mut task) = tasks.get_mut(&id) {
                            task.status = BatchStatus::Failed;
                            task.error = Some(e.to_string());
                        }
                        return;
                    }
                    FailureMode::ContinueSiblings => {
                        if let Some(mut task) = tasks.get_mut(&id) {
                            task.results.insert(keyword.clone(), None);
                            task.progress += 1;
                        }
                    }
                }
            }
        }
    }

    if let Some(mut task) = tasks.get_mut(&id) {
        task.status = BatchStatus::Completed;
    }
    info!("Batch {} completed", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::TrackerError;
    use crate::types::Rank;

    /// Canned markup per keyword; missing keywords fail the fetch.
    struct StubFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, keyword: &str) -> Result<String, TrackerError> {
            self.pages
                .get(keyword)
                .cloned()
                .ok_or_else(|| TrackerError::Navigation(format!("no page for '{}'", keyword)))
        }
    }

    fn page_with_match(position: usize) -> String {
        let mut blocks = String::new();
        for i in 1..position {
            blocks.push_str(&format!(
                r#"<div class="tF2Cxc"><a href="https://other{i}.example"><h3>Other {i}</h3></a></div>"#
            ));
        }
        blocks.push_str(
            r#"<div class="tF2Cxc"><a href="https://web.com/hit"><h3>Hit</h3></a></div>"#,
        );
        format!("<html><body>{}</body></html>", blocks)
    }

    async fn wait_for_finish(registry: &TaskRegistry, id: Uuid) -> BatchTask {
        for _ in 0..200 {
            if let Some(task) = registry.status(&id) {
                if task.status != BatchStatus::Running {
                    return task;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("batch {} did not finish in time", id);
    }

    fn registry_in(dir: &std::path::Path, pages: HashMap<String, String>) -> TaskRegistry {
        let config = TrackerConfig::default().with_data_dir(dir);
        let store = Arc::new(RankStore::new(&config).unwrap());
        TaskRegistry::new(Arc::new(StubFetcher { pages }), store, &config)
    }

    #[tokio::test]
    async fn test_batch_with_failing_fetch_still_stores_every_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let mut pages = HashMap::new();
        pages.insert("alpha".to_string(), page_with_match(1));
        // "beta" has no page: its fetch fails and degrades to not-found.
        pages.insert("gamma".to_string(), page_with_match(3));
        let registry = registry_in(dir.path(), pages);

        let id = registry.submit(vec!["alpha".into(), "beta".into(), "gamma".into()]);
        let task = wait_for_finish(&registry, id).await;

        assert_eq!(task.status, BatchStatus::Completed);
        assert_eq!(task.progress, 3);
        assert_eq!(task.results.len(), 3);
        assert_eq!(task.results["alpha"].as_ref().unwrap().rank, 1);
        assert!(task.results["beta"].is_none());
        assert_eq!(task.results["gamma"].as_ref().unwrap().rank, 3);

        // Every keyword got exactly one stored row; beta's is the sentinel.
        let config = TrackerConfig::default().with_data_dir(dir.path());
        let store = RankStore::new(&config).unwrap();
        assert_eq!(store.history("alpha").len(), 1);
        let beta = store.history("beta");
        assert_eq!(beta.len(), 1);
        assert_eq!(beta[0].rank, Rank::NotFound);
        assert_eq!(store.history("gamma").len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut pages = HashMap::new();
        pages.insert("first".to_string(), page_with_match(2));
        pages.insert("second".to_string(), page_with_match(1));
        pages.insert("third".to_string(), page_with_match(1));

        let config = TrackerConfig::default()
            .with_data_dir(dir.path())
            .with_lock_timeout(Duration::from_millis(100));
        let store = Arc::new(RankStore::new(&config).unwrap());
        let registry = TaskRegistry::new(Arc::new(StubFetcher { pages }), store, &config);

        // A stranded lock on "second" forces a lock timeout mid-batch.
        fs::write(dir.path().join("second.csv.lock"), "999").unwrap();

        let id = registry.submit(vec!["first".into(), "second".into(), "third".into()]);
        let task = wait_for_finish(&registry, id).await;

        assert_eq!(task.status, BatchStatus::Failed);
        assert_eq!(task.progress, 1);
        assert!(task.error.as_deref().unwrap().contains("second"));
        // "first" was processed before the abort and keeps its row.
        let store = RankStore::new(&config).unwrap();
        assert_eq!(store.history("first").len(), 1);
        assert!(store.history("third").is_empty());
    }

    #[tokio::test]
    async fn test_continue_siblings_processes_past_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut pages = HashMap::new();
        pages.insert("first".to_string(), page_with_match(1));
        pages.insert("second".to_string(), page_with_match(1));
        pages.insert("third".to_string(), page_with_match(2));

        let config = TrackerConfig::default()
            .with_data_dir(dir.path())
            .with_lock_timeout(Duration::from_millis(100))
            .with_failure_mode(FailureMode::ContinueSiblings);
        let store = Arc::new(RankStore::new(&config).unwrap());
        let registry = TaskRegistry::new(Arc::new(StubFetcher { pages }), store, &config);

        fs::write(dir.path().join("second.csv.lock"), "999").unwrap();

        let id = registry.submit(vec!["first".into(), "second".into(), "third".into()]);
        let task = wait_for_finish(&registry, id).await;

        assert_eq!(task.status, BatchStatus::Completed);
        assert_eq!(task.progress, 3);
        assert!(task.results["second"].is_none());

        let store = RankStore::new(&config).unwrap();
        assert_eq!(store.history("third").len(), 1);
        // The failed append never landed a row.
        assert!(store.history("second").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_task_id() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(dir.path(), HashMap::new());
        assert!(registry.status(&Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_blank_keywords_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut pages = HashMap::new();
        pages.insert("kept".to_string(), page_with_match(1));
        let registry = registry_in(dir.path(), pages);

        let id = registry.submit(vec!["  ".into(), "kept".into(), "".into()]);
        let task = wait_for_finish(&registry, id).await;

        assert_eq!(task.total, 1);
        assert_eq!(task.keywords, vec!["kept"]);
        assert_eq!(task.progress, 1);
    }

    #[tokio::test]
    async fn test_concurrent_batches_run_independently() {
        let dir = tempfile::tempdir().unwrap();
        let mut pages = HashMap::new();
        pages.insert("one".to_string(), page_with_match(1));
        pages.insert("two".to_string(), page_with_match(2));
        let registry = registry_in(dir.path(), pages);

        let a = registry.submit(vec!["one".into()]);
        let b = registry.submit(vec!["two".into()]);

        let task_a = wait_for_finish(&registry, a).await;
        let task_b = wait_for_finish(&registry, b).await;
        assert_eq!(task_a.status, BatchStatus::Completed);
        assert_eq!(task_b.status, BatchStatus::Completed);
        assert_ne!(a, b);
    }
}
