use futures::future::LocalBoxFuture;
use std::time::Duration;

pub type LocalTask = LocalBoxFuture<'static, ()>;

/// Port for the cooperative, single-threaded event loop the synchronizer runs on.
pub trait SchedulerPort: Send + Sync {
    /// Run a task to completion on the current thread's event loop.
    fn spawn(&self, task: LocalTask);

    /// Future resolving once `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> LocalTask;
}
