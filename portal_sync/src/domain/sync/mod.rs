pub mod error;
pub mod relay;
pub mod state;
pub mod synchronizer;

pub use error::SyncError;
pub use relay::RelayMessage;
pub use state::{SyncOptions, SyncState, SyncStrategy, DEFAULT_POLL_INTERVAL};
pub use synchronizer::{FetchFuture, SnapshotFetcher, Synchronizer};
