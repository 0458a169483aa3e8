use async_trait::async_trait;
use crate::error::Result;
use crate::types::RateRecord;

/// Source of funding-rate snapshots. Implementations own their retry policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RateRecord>>;
    fn source_id(&self) -> &str;
}
