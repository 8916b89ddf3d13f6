use crate::ports::{LocalTask, SchedulerPort};
use std::time::Duration;

/// Browser event-loop scheduler: microtask-driven local futures and `setTimeout`.
#[derive(Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulerPort for Scheduler {
    fn spawn(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalTask {
        let millis = duration.as_millis().min(u32::MAX as u128) as u32;
        Box::pin(gloo_timers::future::TimeoutFuture::new(millis))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn test_spawn_and_sleep() {
        let scheduler = Scheduler::new();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        scheduler.spawn(Box::pin(async move { flag.set(true) }));

        scheduler.sleep(Duration::from_millis(20)).await;
        assert!(done.get());
    }
}
