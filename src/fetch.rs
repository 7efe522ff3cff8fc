//! Browser-driven page fetching.
//!
//! Each fetch launches its own Chromium session, navigates to the search
//! URL, waits a randomized settle delay so client-side rendering finishes,
//! captures the rendered markup and archives it for auditing. The browser
//! is torn down on every exit path.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::store::sanitize_keyword;
use crate::traits::Fetcher;

/// Build the search URL for a query: spaces collapse to `+`, with the
/// configured fixed result-count parameter.
pub fn search_url(config: &TrackerConfig, keyword: &str) -> String {
    let query = keyword.trim().replace(' ', "+");
    format!(
        "{}?q={}&num={}",
        config.search_base, query, config.result_count
    )
}

pub struct PageFetcher {
    config: TrackerConfig,
}

impl PageFetcher {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), TrackerError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", self.config.user_agent));

        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(TrackerError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| TrackerError::Browser(e.to_string()))?;

        // Browser event loop runs until the fetch tears it down.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        Ok((browser, handle))
    }

    async fn capture(&self, browser: &Browser, keyword: &str) -> Result<String, TrackerError> {
        let url = search_url(&self.config, keyword);
        info!("Navigating to {}", url);

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| TrackerError::Browser(e.to_string()))?;

        page.goto(url.as_str())
            .await
            .map_err(|e| TrackerError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| TrackerError::Navigation(e.to_string()))?;

        // Human-timing delay; also lets client-side rendering settle.
        let settle_ms = rand::thread_rng().gen_range(
            self.config.settle_delay_min.as_millis() as u64
                ..=self.config.settle_delay_max.as_millis() as u64,
        );
        debug!("Settle delay: {}ms", settle_ms);
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;

        let html = page
            .content()
            .await
            .map_err(|e| TrackerError::Navigation(e.to_string()))?;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        Ok(html)
    }

    fn archive_path(&self, keyword: &str) -> PathBuf {
        self.config
            .archive_dir
            .join(format!("{}.html", sanitize_keyword(keyword)))
    }

    /// Persist the raw markup for later inspection. Overwrites any prior
    /// archive for the same keyword. Failures are logged, never propagated.
    fn archive(&self, keyword: &str, html: &str) {
        let path = self.archive_path(keyword);
        let result = std::fs::create_dir_all(&self.config.archive_dir)
            .and_then(|_| std::fs::write(&path, html));
        match result {
            Ok(()) => info!("Saved search results to {:?}", path),
            Err(e) => warn!("Failed to archive page for '{}': {}", keyword, e),
        }
    }

    /// Delete archived pages older than the retention window. Best-effort:
    /// unreadable entries are skipped.
    fn sweep_archive(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        if !self.config.archive_dir.exists() {
            return Ok(0);
        }

        let now = SystemTime::now();
        for entry in std::fs::read_dir(&self.config.archive_dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    debug!("Unreadable archive entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }

            let age = path
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok());

            if age.is_some_and(|age| age > self.config.archive_retention) {
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        info!("Deleted old archive file: {:?}", path);
                        removed += 1;
                    }
                    Err(e) => debug!("Failed to delete {:?}: {}", path, e),
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, keyword: &str) -> Result<String, TrackerError> {
        let (mut browser, handler_task) = self.launch().await?;

        let result = self.capture(&browser, keyword).await;

        // Teardown happens regardless of how the capture went.
        if let Err(e) = browser.close().await {
            debug!("Failed to close browser: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();

        if let Ok(html) = &result {
            self.archive(keyword, html);
        }

        if let Err(e) = self.sweep_archive() {
            warn!("Error cleaning old archive files: {}", e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let config = TrackerConfig::default();
        assert_eq!(
            search_url(&config, "Laravel development company"),
            "https://www.google.com/search?q=Laravel+development+company&num=20"
        );
    }

    #[test]
    fn test_search_url_trims_and_respects_count() {
        let config = TrackerConfig::default().with_result_count(50);
        assert_eq!(
            search_url(&config, "  nuxt  "),
            "https://www.google.com/search?q=nuxt&num=50"
        );
    }

    #[test]
    fn test_archive_overwrites_and_sweep_removes_stale() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::default()
            .with_archive_dir(dir.path())
            .with_archive_retention(Duration::from_secs(3600));
        let fetcher = PageFetcher::new(config);

        fetcher.archive("Nuxt.js Development", "<html>v1</html>");
        fetcher.archive("Nuxt.js Development", "<html>v2</html>");

        let path = fetcher.archive_path("Nuxt.js Development");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>v2</html>");

        // Fresh file survives the sweep.
        assert_eq!(fetcher.sweep_archive().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_sweep_deletes_files_past_retention() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackerConfig::default()
            .with_archive_dir(dir.path())
            .with_archive_retention(Duration::ZERO);
        let fetcher = PageFetcher::new(config);

        fetcher.archive("old keyword", "<html></html>");
        // Zero retention: anything with measurable age is stale.
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(fetcher.sweep_archive().unwrap(), 1);
        assert!(!fetcher.archive_path("old keyword").exists());
    }

    #[test]
    fn test_sweep_on_missing_dir_is_noop() {
        let config = TrackerConfig::default().with_archive_dir("/nonexistent/rank-archive");
        let fetcher = PageFetcher::new(config);
        assert_eq!(fetcher.sweep_archive().unwrap(), 0);
    }
}
