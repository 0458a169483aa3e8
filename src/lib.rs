pub mod utils;
pub mod types;
pub mod error;
pub mod config;
pub mod interfaces;
pub mod market_data;
pub mod funding;
pub mod cache;
pub mod alerts;
pub mod query;
pub mod commands;
pub mod telegram;
pub mod api;
pub mod observability;

// Entries kept per ranking
pub const DEFAULT_TOP_K: usize = 3;

// Upstream rates are fractions; 0.0125 is shown as 1.25%
pub const PERCENT_MULTIPLIER: f64 = 100.0;

// Pending chat commands buffered between the webhook and the worker
pub const COMMAND_QUEUE_CAPACITY: usize = 64;
