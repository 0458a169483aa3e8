pub mod handler;

pub use handler::{OnDemandQueryHandler, QueryMode, QueryReply, REQUERY_CALLBACK};
