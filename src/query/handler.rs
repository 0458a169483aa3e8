use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use crate::cache::SharedRateCache;
use crate::funding::{rank, RankMode};
use crate::interfaces::messenger::InlineButton;
use crate::interfaces::rate_source::RateSource;
use crate::types::RankedEntry;
use crate::utils::helper::{format_entries, format_timestamp};

/// Callback payload of the re-query button.
pub const REQUERY_CALLBACK: &str = "top3_funding";

pub const QUERY_FAILED_TEXT: &str = "Query failed, please try again later.";

/// Where on-demand answers come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Only the scheduler's last publish.
    CacheOnly,
    /// The cache, or a direct fetch while nothing has been published.
    #[default]
    FetchIfEmpty,
    /// A direct fetch on every request.
    AlwaysFetch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryReply {
    pub text: String,
    pub buttons: Vec<InlineButton>,
    pub succeeded: bool,
}

impl QueryReply {
    fn ranked(entries: &[RankedEntry], at: DateTime<Utc>) -> Self {
        QueryReply {
            text: format!(
                "Top {} funding rates ({}):\n\n{}",
                entries.len(),
                format_timestamp(at),
                format_entries(entries)
            ),
            buttons: vec![InlineButton::new("Refresh", REQUERY_CALLBACK)],
            succeeded: true,
        }
    }

    pub fn failed() -> Self {
        QueryReply {
            text: QUERY_FAILED_TEXT.to_string(),
            buttons: vec![InlineButton::new("Retry", REQUERY_CALLBACK)],
            succeeded: false,
        }
    }
}

pub struct OnDemandQueryHandler {
    cache: Arc<SharedRateCache>,
    source: Option<Arc<dyn RateSource>>,
    mode: QueryMode,
    rank_mode: RankMode,
    top_k: usize,
    // One outstanding upstream fetch from this path at a time.
    fetch_lock: Mutex<()>,
}

impl OnDemandQueryHandler {
    pub fn new(
        cache: Arc<SharedRateCache>,
        source: Option<Arc<dyn RateSource>>,
        mode: QueryMode,
        rank_mode: RankMode,
        top_k: usize,
    ) -> Self {
        OnDemandQueryHandler {
            cache,
            source,
            mode,
            rank_mode,
            top_k,
            fetch_lock: Mutex::new(()),
        }
    }

    /// Always produces a user-facing reply; failures become a retry prompt.
    pub async fn handle(&self) -> QueryReply {
        match self.mode {
            QueryMode::CacheOnly => self.from_cache().unwrap_or_else(|| {
                tracing::info!("Query before any published data");
                QueryReply::failed()
            }),
            QueryMode::FetchIfEmpty => match self.from_cache() {
                Some(reply) => reply,
                None => self.fetch_fresh().await,
            },
            QueryMode::AlwaysFetch => self.fetch_fresh().await,
        }
    }

    fn from_cache(&self) -> Option<QueryReply> {
        let snapshot = self.cache.get();
        match snapshot.fetched_at {
            Some(at) if !snapshot.result.is_empty() => {
                Some(QueryReply::ranked(&snapshot.result, at))
            }
            _ => None,
        }
    }

    async fn fetch_fresh(&self) -> QueryReply {
        let Some(source) = &self.source else {
            tracing::warn!("Query needs a fetch but no rate source is configured");
            return QueryReply::failed();
        };

        let _guard = self.fetch_lock.lock().await;
        match source.fetch().await {
            Ok(records) => {
                let ranked = rank(&records, self.rank_mode, self.top_k);
                if ranked.is_empty() {
                    tracing::warn!("Upstream returned no funding rates");
                    QueryReply::failed()
                } else {
                    QueryReply::ranked(&ranked, Utc::now())
                }
            }
            Err(e) => {
                tracing::error!("On-demand fetch failed: {}", e);
                QueryReply::failed()
            }
        }
    }
}
