use std::sync::Arc;

use rank_tracker::{LookupRequest, PageFetcher, RankService, RankStore, TrackerConfig};
use tower::Service;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let target = std::env::var("TARGET_DOMAIN").unwrap_or_else(|_| "web.com".to_string());
    let keyword = std::env::var("KEYWORD").unwrap_or_else(|_| "Laravel development company".to_string());

    let config = TrackerConfig::new(&target);
    let store = Arc::new(RankStore::new(&config).expect("failed to open rank store"));
    let fetcher = Arc::new(PageFetcher::new(config.clone()));

    let mut service = RankService::new(fetcher, store.clone(), &config.target_domain);

    println!("=== Rank Lookup Demo ===");
    println!("Target domain: {}", target);
    println!("Keyword: {}", keyword);

    match service.call(LookupRequest::new(&keyword)).await {
        Ok(result) => match result.hit {
            Some(hit) => {
                println!("✓ Ranked #{}: {} ({})", hit.rank, hit.title, hit.url);
            }
            None => {
                println!("✗ Not found in the results page");
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
        }
    }

    let history = store.history(&keyword);
    println!("Series now holds {} observation(s)", history.len());
}
