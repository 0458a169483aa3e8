pub mod helper;
pub mod task_supervisor;

pub use task_supervisor::TaskSupervisor;
