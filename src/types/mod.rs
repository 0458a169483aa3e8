pub mod funding_rate;
pub mod ids;
pub mod rate_record;

pub use funding_rate::FundingRate;
pub use ids::{CallbackId, ChatId, MessageId};
pub use rate_record::{RankedEntry, RankedResult, RateRecord};
