use tokio::task::JoinHandle;
use std::collections::HashMap;
use crate::error::{Error, Result};
use tracing::{info, error};

/// Task Supervisor - keeps track of the long-running bot tasks
///
/// The alert scheduler and the command worker are both expected to live
/// for the whole process. A task that returns (or panics) is reported by
/// `check_health` so the process can shut down instead of running half-dead.
///
/// ## Usage
/// ```ignore
/// let mut supervisor = TaskSupervisor::new();
/// supervisor.spawn("alert_scheduler", Arc::clone(&scheduler).run());
///
/// if let Err(e) = supervisor.check_health() {
///     error!("Task failure detected: {}", e);
/// }
/// ```
pub struct TaskSupervisor {
    tasks: HashMap<String, JoinHandle<()>>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: HashMap::new(),
        }
    }

    /// Spawn a background task and register it for monitoring
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        info!("Spawned background task: {}", name);
        self.tasks.insert(name, handle);
        self
    }

    /// Errors if any registered task has terminated. Terminated tasks are dropped from tracking.
    pub fn check_health(&mut self) -> Result<()> {
        let mut failed_tasks: Vec<String> = self.tasks
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect();

        if failed_tasks.is_empty() {
            return Ok(());
        }

        failed_tasks.sort();
        for name in &failed_tasks {
            self.tasks.remove(name);
        }

        let error_msg = format!("Tasks terminated unexpectedly: {:?}", failed_tasks);
        error!("{}", error_msg);
        Err(Error::TaskFailed(error_msg))
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every task. Neither task holds state that needs flushing.
    pub fn shutdown_all(&mut self) {
        info!("Shutting down {} background tasks", self.tasks.len());

        for (name, handle) in self.tasks.drain() {
            handle.abort();
            info!("Aborted task: {}", name);
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn reports_tasks_that_exit() {
        let mut supervisor = TaskSupervisor::new();
        supervisor
            .spawn("forever", std::future::pending())
            .spawn("short_lived", async {});

        for _ in 0..100 {
            if supervisor.check_health().is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(supervisor.active_task_count(), 1);
        assert!(supervisor.check_health().is_ok());
    }

    #[tokio::test]
    async fn shutdown_aborts_everything() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn("a", std::future::pending()).spawn("b", std::future::pending());
        assert_eq!(supervisor.active_task_count(), 2);

        supervisor.shutdown_all();
        assert_eq!(supervisor.active_task_count(), 0);
        assert!(supervisor.check_health().is_ok());
    }
}
