use std::time::Duration;
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use crate::alerts::schedule::TriggerSchedule;
use crate::error::{Error, Result};

pub const DEFAULT_TRIGGER_TIMES: [&str; 6] = ["03:55", "07:55", "11:55", "15:55", "19:55", "23:55"];

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleConfig {
    Daily { times: Vec<String>, utc_offset: String },
    Interval {
        #[serde(deserialize_with = "seconds_from_number_or_text")]
        every_secs: u64,
    },
}

// Tagged variants are buffered before the config crate can coerce env strings.
fn seconds_from_number_or_text<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSeconds {
        Number(u64),
        Text(String),
    }

    match RawSeconds::deserialize(deserializer)? {
        RawSeconds::Number(secs) => Ok(secs),
        RawSeconds::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("every_secs must be a whole number of seconds, got {:?}", text))
        }),
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig::Daily {
            times: DEFAULT_TRIGGER_TIMES.iter().map(|t| t.to_string()).collect(),
            utc_offset: "+08:00".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn to_trigger_schedule(&self) -> Result<TriggerSchedule> {
        match self {
            ScheduleConfig::Daily { times, utc_offset } => {
                let offset: FixedOffset = utc_offset.parse()
                    .map_err(|_| Error::InvalidSchedule(format!("bad utc offset: {}", utc_offset)))?;

                let parsed = times.iter()
                    .map(|t| {
                        NaiveTime::parse_from_str(t.trim(), "%H:%M")
                            .map_err(|_| Error::InvalidSchedule(format!("bad trigger time: {}", t)))
                    })
                    .collect::<Result<Vec<_>>>()?;

                TriggerSchedule::daily(parsed, offset)
            }
            ScheduleConfig::Interval { every_secs } => {
                TriggerSchedule::every(Duration::from_secs(*every_secs))
            }
        }
    }
}
