use async_trait::async_trait;

mod client;
mod endpoints;
mod metrics;
mod region;
mod retry;
mod types;

pub use client::ValorantClient;
pub use metrics::RequestMetrics;
pub use region::{Platform, Region};
pub use retry::RetryPolicy;
pub use types::{ApiError, ApiResult, RawRankResponse, ValorantAccount};

/// Where the sync engine gets raw rank data from.
#[async_trait]
pub trait RankSource: Send + Sync {
    async fn fetch_rank(&self, account: &ValorantAccount) -> ApiResult<RawRankResponse>;
}

#[async_trait]
impl RankSource for ValorantClient {
    async fn fetch_rank(&self, account: &ValorantAccount) -> ApiResult<RawRankResponse> {
        self.get_rank(account).await
    }
}
