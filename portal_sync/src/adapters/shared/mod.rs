/// Target-independent adapters: in-memory implementations usable in the browser,
/// natively, and in tests.

pub mod memory_notifications;
pub mod memory_store;
pub mod realtime;

pub use memory_notifications::MemoryNotificationStore;
pub use memory_store::{MemoryStoreContext, SharedMemoryStore};
pub use realtime::{DisabledRealtime, MemoryRealtime};
