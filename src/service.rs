use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::error::TrackerError;
use crate::pipeline;
use crate::store::RankStore;
use crate::traits::Fetcher;
use crate::types::RankHit;

/// Single-keyword lookup request.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub keyword: String,
}

impl LookupRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().trim().to_string(),
        }
    }
}

/// Outcome of one lookup. `hit: None` means the target domain was not
/// found on the page (or the fetch failed); the observation is stored
/// either way.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub keyword: String,
    pub hit: Option<RankHit>,
}

/// tower::Service facade over the rank-lookup pipeline. This is the narrow
/// interface a presentation layer calls for single lookups; batches go
/// through the [`crate::batch::TaskRegistry`].
#[derive(Clone)]
pub struct RankService {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<RankStore>,
    target_domain: String,
}

impl RankService {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<RankStore>,
        target_domain: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            store,
            target_domain: target_domain.into(),
        }
    }
}

impl Service<LookupRequest> for RankService {
    type Response = LookupResult;
    type Error = TrackerError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: LookupRequest) -> Self::Future {
        info!("Lookup request received: keyword='{}'", req.keyword);

        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let target_domain = self.target_domain.clone();

        Box::pin(async move {
            let hit = pipeline::lookup(
                fetcher.as_ref(),
                store.as_ref(),
                &target_domain,
                &req.keyword,
            )
            .await?;

            Ok(LookupResult {
                keyword: req.keyword,
                hit,
            })
        })
    }
}
