// Hexagonal architecture modules
pub mod adapters;
pub mod domain;
pub mod platform;
pub mod ports;

pub mod config;
pub mod context;
pub mod facades;
#[cfg(target_arch = "wasm32")]
pub mod global;
pub mod measure;

pub use config::SyncConfig;
pub use context::AppContext;
pub use domain::broadcast::{Broadcaster, DataUpdate};
pub use domain::events::{AppEvent, AppEventBus, EventBus, ListenerError, Resource};
pub use domain::notifications::{
    Notification, NotificationCenter, NotificationError, NotificationFilter, NotificationState,
};
pub use domain::subscription::Subscription;
pub use domain::sync::{SyncError, SyncOptions, SyncState, SyncStrategy, Synchronizer};
pub use platform::Platform;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start_app() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    Ok(())
}
