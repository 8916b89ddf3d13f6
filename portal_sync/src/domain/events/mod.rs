pub mod bus;
pub mod error;
pub mod kinds;

pub use bus::{EventBus, EventKey};
pub use error::ListenerError;
pub use kinds::{AppEvent, AppEventBus, Resource};
