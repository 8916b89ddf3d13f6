use crate::ports::{LocalTask, SchedulerPort};
use std::time::Duration;

/// Native scheduler backed by tokio.
///
/// Tasks are spawned with `tokio::task::spawn_local`, so callers must be running
/// inside a `tokio::task::LocalSet` on a current-thread runtime.
#[derive(Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulerPort for Scheduler {
    fn spawn(&self, task: LocalTask) {
        tokio::task::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalTask {
        Box::pin(tokio::time::sleep(duration))
    }
}
