use rank_tracker::{AnalysisClient, RankStore, TrackerConfig};

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let keyword = std::env::var("KEYWORD").expect("KEYWORD environment variable not set");
    let endpoint =
        std::env::var("GENERATE_ENDPOINT").unwrap_or_else(|_| "http://localhost:11434".to_string());
    let model = std::env::var("GENERATE_MODEL").unwrap_or_else(|_| "phi3".to_string());

    let config = TrackerConfig::default();
    let store = RankStore::new(&config).expect("failed to open rank store");
    let client = AnalysisClient::new(&endpoint, &model);

    println!("=== Trend Analysis Demo ===");
    println!("Keyword: {}", keyword);

    let report = client.analyze_keyword(&store, &keyword).await;
    if let Some(error) = &report.error {
        eprintln!("✗ {}", error);
        return;
    }

    println!("{} rows in {} chunk(s):", report.total_rows, report.analyses.len());
    for chunk in &report.analyses {
        println!("--- Chunk {} ---", chunk.chunk);
        println!("{}", chunk.analysis);
        println!();
    }
}
