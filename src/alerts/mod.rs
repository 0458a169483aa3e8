pub mod dispatcher;
pub mod schedule;
pub mod scheduler;

pub use dispatcher::NotificationDispatcher;
pub use schedule::TriggerSchedule;
pub use scheduler::{AlertScheduler, CycleOutcome, SchedulerPhase, SchedulerSettings};
