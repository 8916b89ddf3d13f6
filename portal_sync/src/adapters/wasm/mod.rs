/// WASM adapters - implementations using browser APIs.

pub mod clock;
pub mod console_logger;
pub mod error_conversions;
pub mod local_storage;
pub mod scheduler;
pub mod websocket_realtime;

pub use clock::Clock;
pub use console_logger::ConsoleLogger;
pub use local_storage::LocalStorageStore;
pub use scheduler::Scheduler;
pub use websocket_realtime::WebSocketRealtime;
