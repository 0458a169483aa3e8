pub mod messenger;
pub mod rate_source;

pub use messenger::{InlineButton, Messenger};
pub use rate_source::RateSource;
