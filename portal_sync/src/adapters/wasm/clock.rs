use crate::global::get_global_scope;
use crate::ports::clock::ClockPort;
use wasm_bindgen::JsCast;
use web_sys::{Performance, WorkerGlobalScope};

#[derive(Clone, Copy, Default)]
pub struct Clock;

impl Clock {
    pub fn new() -> Self {
        Self
    }

    fn get_performance(&self) -> Option<Performance> {
        match get_global_scope() {
            Ok(scope) => {
                if let Ok(worker) = scope.clone().dyn_into::<WorkerGlobalScope>() {
                    worker.performance()
                } else if let Ok(window) = scope.dyn_into::<web_sys::Window>() {
                    window.performance()
                } else {
                    None
                }
            }
            Err(_) => None,
        }
    }
}

impl ClockPort for Clock {
    fn now(&self) -> f64 {
        js_sys::Date::now()
    }

    fn is_available(&self) -> bool {
        self.get_performance().is_some()
    }
}
