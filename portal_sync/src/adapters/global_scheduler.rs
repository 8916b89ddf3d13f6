use crate::ports::SchedulerPort;
use once_cell::sync::Lazy;

#[cfg(target_arch = "wasm32")]
use crate::adapters::wasm::Scheduler;
#[cfg(not(target_arch = "wasm32"))]
use crate::adapters::native::Scheduler;

pub static SCHEDULER: Lazy<Scheduler> = Lazy::new(Scheduler::new);

/// Returns a reference to the event-loop scheduler for the current target.
pub fn scheduler() -> &'static dyn SchedulerPort {
    &*SCHEDULER
}
