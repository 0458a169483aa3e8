use std::time::Duration;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Utc};
use crate::error::{Error, Result};

/// When the alert flow fires.
#[derive(Clone, Debug, PartialEq)]
pub enum TriggerSchedule {
    /// Fixed wall-clock times every day, read at `offset`.
    Daily { times: Vec<NaiveTime>, offset: FixedOffset },
    /// Fixed period anchored at process start.
    Every(chrono::Duration),
}

impl TriggerSchedule {
    pub fn daily(mut times: Vec<NaiveTime>, offset: FixedOffset) -> Result<Self> {
        if times.is_empty() {
            return Err(Error::InvalidSchedule("no trigger times".to_string()));
        }
        times.sort();
        times.dedup();
        Ok(TriggerSchedule::Daily { times, offset })
    }

    pub fn every(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::InvalidSchedule("interval must be positive".to_string()));
        }
        let step = chrono::Duration::from_std(period)
            .ok()
            .filter(|step| *step <= max_interval())
            .ok_or_else(|| {
                Error::InvalidSchedule(format!("interval of {}s exceeds one year", period.as_secs()))
            })?;
        Ok(TriggerSchedule::Every(step))
    }

    /// First trigger after start. Interval schedules fire immediately.
    pub fn first_trigger(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TriggerSchedule::Daily { .. } => self.next_after(now),
            TriggerSchedule::Every(_) => now,
        }
    }

    /// Next trigger strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TriggerSchedule::Daily { times, offset } => {
                let local = now.with_timezone(offset).naive_local();
                let today = local.date();

                let next_local = times.iter()
                    .map(|t| today.and_time(*t))
                    .find(|candidate| *candidate > local)
                    .unwrap_or_else(|| {
                        let first = times.first().copied().unwrap_or(NaiveTime::MIN);
                        (today + chrono::Duration::days(1)).and_time(first)
                    });

                local_to_utc(next_local, offset)
            }
            TriggerSchedule::Every(step) => now + *step,
        }
    }

    /// Trigger following `previous`, skipping any that already passed by `now`.
    /// Missed triggers are dropped, never replayed.
    pub fn next_following(&self, previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TriggerSchedule::Daily { .. } => self.next_after(previous.max(now)),
            TriggerSchedule::Every(step) => {
                let step = *step;
                let mut next = previous + step;
                while next <= now {
                    next = next + step;
                }
                next
            }
        }
    }
}

fn local_to_utc(local: NaiveDateTime, offset: &FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - chrono::Duration::seconds(offset.local_minus_utc() as i64)))
}

fn max_interval() -> chrono::Duration {
    chrono::Duration::days(366)
}
