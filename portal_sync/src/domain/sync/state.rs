use super::error::SyncError;
use std::rc::Rc;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    Realtime,
    Polling,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub poll_interval: Duration,
    /// Refetch when another context signals a data update for the resource.
    pub listen_for_broadcasts: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            listen_for_broadcasts: true,
        }
    }
}

impl SyncOptions {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// What a mounted consumer renders from. `data` is replaced wholesale on every
/// successful fetch and kept as-is when a fetch fails.
#[derive(Debug)]
pub struct SyncState<T> {
    pub data: Rc<Vec<T>>,
    pub loading: bool,
    pub error: Option<SyncError>,
    pub last_updated: Option<f64>,
}

impl<T> Clone for SyncState<T> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
            loading: self.loading,
            error: self.error.clone(),
            last_updated: self.last_updated,
        }
    }
}

impl<T> Default for SyncState<T> {
    fn default() -> Self {
        Self {
            data: Rc::new(Vec::new()),
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}
