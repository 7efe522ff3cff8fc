//! Combined rank lookup: fetch, extract, append.

use tracing::{info, warn};

use crate::error::TrackerError;
use crate::extract::extract_rank;
use crate::store::RankStore;
use crate::traits::Fetcher;
use crate::types::RankHit;

/// Run one keyword through the full pipeline.
///
/// A fetch failure is absorbed into a not-found observation so that every
/// lookup attempt lands exactly one stored row; only store failures
/// propagate to the caller.
pub async fn lookup(
    fetcher: &dyn Fetcher,
    store: &RankStore,
    target_domain: &str,
    keyword: &str,
) -> Result<Option<RankHit>, TrackerError> {
    let hit = match fetcher.fetch(keyword).await {
        Ok(html) => extract_rank(&html, target_domain),
        Err(e) => {
            warn!("Fetch failed for keyword '{}': {}", keyword, e);
            None
        }
    };

    store.append(keyword, hit.as_ref()).await?;

    match &hit {
        Some(hit) => info!("Keyword '{}' ranked at position {}", keyword, hit.rank),
        None => info!("Keyword '{}' not found in results", keyword),
    }
    Ok(hit)
}
