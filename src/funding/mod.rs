pub mod ranker;
pub mod threshold;

pub use ranker::{rank, RankMode};
pub use threshold::filter_above_threshold;
