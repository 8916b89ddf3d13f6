use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;

pub static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

/// Enables `time`/`time_end` logging around snapshot fetches.
#[wasm_bindgen]
pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::SeqCst);
}

pub fn is_debug_mode() -> bool {
    DEBUG_MODE.load(Ordering::SeqCst)
}

#[macro_export]
macro_rules! time_it {
    ($label:expr, $block:expr) => {{
        let debug = $crate::measure::is_debug_mode();
        if debug && $crate::adapters::clock().is_available() {
            $crate::adapters::logger().time($label);
        }
        let result = $block;
        if debug && $crate::adapters::clock().is_available() {
            $crate::adapters::logger().time_end($label);
        }
        result
    }};
}

pub use crate::time_it;
