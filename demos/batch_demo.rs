use std::sync::Arc;
use std::time::Duration;

use rank_tracker::{BatchStatus, PageFetcher, RankStore, TaskRegistry, TrackerConfig};

const DEFAULT_KEYWORDS: &[&str] = &[
    "Laravel development company",
    "Laravel Development Services Company",
    "Laravel development services",
    "Laravel development company in India",
    "Laravel development company in Delhi",
    "NuxtJs Development Services Company India",
    "Nuxt.js Development",
    "Software Product Development Services",
    "Product development company in india",
    "Software product development company",
];

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let target = std::env::var("TARGET_DOMAIN").unwrap_or_else(|_| "web.com".to_string());

    let config = TrackerConfig::new(&target);
    let store = Arc::new(RankStore::new(&config).expect("failed to open rank store"));
    let fetcher = Arc::new(PageFetcher::new(config.clone()));
    let registry = TaskRegistry::new(fetcher, store.clone(), &config);

    println!("=== Batch Tracking Demo ===");

    let keywords: Vec<String> = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
    let id = registry.submit(keywords);
    println!("Submitted task {}", id);

    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let Some(task) = registry.status(&id) else {
            eprintln!("Task {} vanished from the registry", id);
            return;
        };

        println!("Progress: {}/{} ({:?})", task.progress, task.total, task.status);
        match task.status {
            BatchStatus::Running => continue,
            BatchStatus::Completed => {
                println!("✓ Batch complete");
                for (keyword, hit) in &task.results {
                    match hit {
                        Some(hit) => println!("  {} → #{}", keyword, hit.rank),
                        None => println!("  {} → not found", keyword),
                    }
                }
                break;
            }
            BatchStatus::Failed => {
                eprintln!("✗ Batch failed: {}", task.error.as_deref().unwrap_or("unknown"));
                break;
            }
        }
    }

    let summary = store.summary();
    println!(
        "Store: {} searches across {} keywords, average rank {:?}",
        summary.total_searches, summary.unique_keywords, summary.average_rank
    );

    match store.export() {
        Ok(path) => println!("Export written to {:?}", path),
        Err(e) => eprintln!("Export error: {}", e),
    }
}
