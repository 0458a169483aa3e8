use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use crate::alerts::dispatcher::NotificationDispatcher;
use crate::alerts::schedule::TriggerSchedule;
use crate::cache::{CacheSnapshot, SharedRateCache};
use crate::error::Result;
use crate::funding::{filter_above_threshold, rank, RankMode};
use crate::interfaces::rate_source::RateSource;
use crate::observability::metrics::ALERT_CYCLES;
use crate::observability::tracing::trace_alert_cycle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    Idle,
    Fetching,
    Notifying,
}

impl SchedulerPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerPhase::Fetching,
            2 => SchedulerPhase::Notifying,
            _ => SchedulerPhase::Idle,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    /// Fetch exhausted its retries; cache untouched.
    FetchFailed,
    /// Cache refreshed, nothing crossed the threshold.
    BelowThreshold { published: usize },
    Notified { alerted: usize },
    /// Cache refreshed, alert could not be delivered.
    DispatchFailed { alerted: usize },
}

impl CycleOutcome {
    fn label(&self) -> &'static str {
        match self {
            CycleOutcome::FetchFailed => "fetch_failed",
            CycleOutcome::BelowThreshold { .. } => "below_threshold",
            CycleOutcome::Notified { .. } => "notified",
            CycleOutcome::DispatchFailed { .. } => "dispatch_failed",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SchedulerSettings {
    pub mode: RankMode,
    pub top_k: usize,
    pub threshold_percent: f64,
    pub prime_cache_on_start: bool,
}

/// Sole writer of the rate cache.
pub struct AlertScheduler {
    source: Arc<dyn RateSource>,
    cache: Arc<SharedRateCache>,
    dispatcher: NotificationDispatcher,
    schedule: TriggerSchedule,
    settings: SchedulerSettings,
    phase: AtomicU8,
}

impl AlertScheduler {
    pub fn new(
        source: Arc<dyn RateSource>,
        cache: Arc<SharedRateCache>,
        dispatcher: NotificationDispatcher,
        schedule: TriggerSchedule,
        settings: SchedulerSettings,
    ) -> Self {
        AlertScheduler {
            source,
            cache,
            dispatcher,
            schedule,
            settings,
            phase: AtomicU8::new(SchedulerPhase::Idle as u8),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        SchedulerPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn enter(&self, phase: SchedulerPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    /// Fetch, rank and publish. The cache is left alone on failure.
    pub async fn refresh(&self) -> Result<Arc<CacheSnapshot>> {
        self.enter(SchedulerPhase::Fetching);
        let fetched = self.source.fetch().await;
        self.enter(SchedulerPhase::Idle);

        let records = fetched?;
        let ranked = rank(&records, self.settings.mode, self.settings.top_k);
        Ok(self.cache.set(ranked))
    }

    /// One trigger's worth of work. Never fails; every outcome is logged.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let outcome = match self.refresh().await {
            Err(e) => {
                tracing::error!("Scheduled fetch failed, skipping cycle: {}", e);
                CycleOutcome::FetchFailed
            }
            Ok(snapshot) => {
                let alerts = filter_above_threshold(&snapshot.result, self.settings.threshold_percent);
                if alerts.is_empty() {
                    tracing::info!(
                        "Cache refreshed with {} entries, none above {}%",
                        snapshot.result.len(),
                        self.settings.threshold_percent
                    );
                    CycleOutcome::BelowThreshold { published: snapshot.result.len() }
                } else {
                    self.enter(SchedulerPhase::Notifying);
                    let sent = self.dispatcher.dispatch(&alerts).await;
                    self.enter(SchedulerPhase::Idle);

                    match sent {
                        Ok(()) => CycleOutcome::Notified { alerted: alerts.len() },
                        Err(e) => {
                            tracing::error!("Alert dispatch failed, cache keeps the new data: {}", e);
                            CycleOutcome::DispatchFailed { alerted: alerts.len() }
                        }
                    }
                }
            }
        };

        ALERT_CYCLES.with_label_values(&[outcome.label()]).inc();
        outcome
    }

    /// Runs until the task is aborted.
    pub async fn run(self: Arc<Self>) {
        let now = Utc::now();
        let mut next = self.schedule.first_trigger(now);

        if self.settings.prime_cache_on_start && next > now {
            match self.refresh().await {
                Ok(snapshot) => tracing::info!("Cache primed with {} entries", snapshot.result.len()),
                Err(e) => tracing::warn!("Initial cache refresh failed: {}", e),
            }
        }

        loop {
            tracing::info!("Next alert cycle at {}", next);
            sleep_until(next).await;

            let trigger = next.to_rfc3339();
            let outcome = self.run_cycle()
                .instrument(trace_alert_cycle(&trigger))
                .await;
            tracing::info!("Alert cycle {} finished: {:?}", trigger, outcome);

            next = self.schedule.next_following(next, Utc::now());
        }
    }
}

async fn sleep_until(at: DateTime<Utc>) {
    if let Ok(wait) = (at - Utc::now()).to_std() {
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::interfaces::messenger::MockMessenger;
    use crate::interfaces::rate_source::MockRateSource;
    use crate::types::{ChatId, MessageId, RateRecord};
    use chrono::FixedOffset;
    use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
    use std::time::Duration;

    fn settings(threshold_percent: f64) -> SchedulerSettings {
        SchedulerSettings {
            mode: RankMode::Absolute,
            top_k: 3,
            threshold_percent,
            prime_cache_on_start: false,
        }
    }

    fn scheduler(
        source: MockRateSource,
        messenger: MockMessenger,
        threshold_percent: f64,
    ) -> (AlertScheduler, Arc<SharedRateCache>) {
        let cache = Arc::new(SharedRateCache::new());
        let dispatcher = NotificationDispatcher::new(Arc::new(messenger), ChatId::new("-1001"), threshold_percent);
        let schedule = TriggerSchedule::every(Duration::from_secs(60)).unwrap();
        let scheduler = AlertScheduler::new(
            Arc::new(source),
            Arc::clone(&cache),
            dispatcher,
            schedule,
            settings(threshold_percent),
        );
        (scheduler, cache)
    }

    fn sample() -> Vec<RateRecord> {
        vec![
            RateRecord::new("BTC", 0.002),
            RateRecord::new("ETH", -0.02),
            RateRecord::new("XRP", 0.015),
        ]
    }

    fn source_returning(records: Vec<RateRecord>) -> MockRateSource {
        let mut source = MockRateSource::new();
        source.expect_fetch().returning(move || Ok(records.clone()));
        source
    }

    #[tokio::test]
    async fn notifies_entries_above_threshold_and_publishes() {
        let mut messenger = MockMessenger::new();
        messenger.expect_send_message()
            .withf(|_, text, _| text.contains("ETH") && text.contains("XRP") && !text.contains("BTC"))
            .times(1)
            .returning(|_, _, _| Ok(MessageId(1)));

        let (scheduler, cache) = scheduler(source_returning(sample()), messenger, 1.0);
        assert_eq!(scheduler.run_cycle().await, CycleOutcome::Notified { alerted: 2 });

        let snapshot = cache.get();
        let symbols: Vec<_> = snapshot.result.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "XRP", "BTC"]);
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    }

    #[tokio::test]
    async fn quiet_market_refreshes_cache_without_sending() {
        let mut messenger = MockMessenger::new();
        messenger.expect_send_message().times(0);

        let (scheduler, cache) = scheduler(source_returning(sample()), messenger, 5.0);
        assert_eq!(scheduler.run_cycle().await, CycleOutcome::BelowThreshold { published: 3 });
        assert!(!cache.get().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_leaves_cache_untouched() {
        let mut source = MockRateSource::new();
        source.expect_fetch().times(1).returning(|| {
            Err(Error::FetchExhausted {
                attempts: 3,
                last_error: Box::new(Error::EnvelopeRejected { success: false, code: 0 }),
            })
        });
        let mut messenger = MockMessenger::new();
        messenger.expect_send_message().times(0);

        let (scheduler, cache) = scheduler(source, messenger, 1.0);
        let before = cache.set(vec![]);

        assert_eq!(scheduler.run_cycle().await, CycleOutcome::FetchFailed);
        assert_eq!(cache.get(), before);
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    }

    fn counting_source(calls: Arc<AtomicU32>) -> MockRateSource {
        let mut source = MockRateSource::new();
        source.expect_fetch().returning(move || {
            calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(sample())
        });
        source
    }

    #[tokio::test]
    async fn run_primes_the_cache_before_a_future_daily_trigger() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut messenger = MockMessenger::new();
        messenger.expect_send_message().times(0);

        let cache = Arc::new(SharedRateCache::new());
        let mut updates = cache.subscribe();
        let in_six_hours = (Utc::now() + chrono::Duration::hours(6)).time();
        let schedule = TriggerSchedule::daily(vec![in_six_hours], FixedOffset::east_opt(0).unwrap()).unwrap();
        let scheduler = Arc::new(AlertScheduler::new(
            Arc::new(counting_source(Arc::clone(&calls))),
            Arc::clone(&cache),
            NotificationDispatcher::new(Arc::new(messenger), ChatId::new("-1001"), 1.0),
            schedule,
            SchedulerSettings { prime_cache_on_start: true, ..settings(1.0) },
        ));

        let task = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::timeout(Duration::from_secs(5), updates.changed())
            .await
            .expect("cache was not primed")
            .unwrap();

        // Priming refreshes only; the first real cycle is hours away.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(cache.get().result.len(), 3);
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
        task.abort();
    }

    #[tokio::test]
    async fn run_fires_an_interval_schedule_immediately_without_priming() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut messenger = MockMessenger::new();
        messenger.expect_send_message().times(0);

        let cache = Arc::new(SharedRateCache::new());
        let mut updates = cache.subscribe();
        let scheduler = Arc::new(AlertScheduler::new(
            Arc::new(counting_source(Arc::clone(&calls))),
            Arc::clone(&cache),
            NotificationDispatcher::new(Arc::new(messenger), ChatId::new("-1001"), 5.0),
            TriggerSchedule::every(Duration::from_secs(3600)).unwrap(),
            SchedulerSettings { prime_cache_on_start: true, ..settings(5.0) },
        ));

        let task = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::timeout(Duration::from_secs(5), updates.changed())
            .await
            .expect("first cycle did not run")
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        assert!(!cache.get().is_empty());
        task.abort();
    }

    #[tokio::test]
    async fn dispatch_failure_keeps_the_cache_update() {
        let mut messenger = MockMessenger::new();
        messenger.expect_send_message()
            .times(1)
            .returning(|_, _, _| Err(Error::TransportError("timeout".to_string())));

        let (scheduler, cache) = scheduler(source_returning(sample()), messenger, 1.0);
        assert_eq!(scheduler.run_cycle().await, CycleOutcome::DispatchFailed { alerted: 2 });
        assert_eq!(cache.get().result.len(), 3);
    }
}
