/// Ports module - Defines the interfaces (traits) that abstract platform-specific functionality.
///
/// This module contains all the port traits that define contracts between the domain layer
/// and the infrastructure adapters. The change-propagation core only ever talks to these
/// traits, which is what lets the same code run in a browser tab and in a native test.

pub mod clock;
pub mod key_value;
pub mod logger;
pub mod notification_store;
pub mod realtime;
pub mod scheduler;

pub use clock::ClockPort;
pub use key_value::{ChangeListener, KeyValueStorePort, StorageChange};
pub use logger::LoggerPort;
pub use notification_store::NotificationStorePort;
pub use realtime::{ChangeCallback, LostCallback, RealtimePort};
pub use scheduler::{LocalTask, SchedulerPort};
