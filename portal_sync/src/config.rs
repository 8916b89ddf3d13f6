use crate::domain::broadcast::DATA_UPDATE_KEY;
use crate::domain::sync::{SyncError, SyncOptions, DEFAULT_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CACHE_PREFIX: &str = "portal:cache:";

/// Runtime configuration of the sync layer, as handed over by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    /// `None` means no realtime backend: every synchronizer polls.
    pub realtime_url: Option<String>,
    pub data_update_key: String,
    pub cache_prefix: String,
    pub cache_snapshots: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            realtime_url: None,
            data_update_key: DATA_UPDATE_KEY.to_string(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_snapshots: false,
        }
    }
}

impl SyncConfig {
    pub fn from_json(raw: &str) -> Result<Self, SyncError> {
        serde_json::from_str(raw).map_err(SyncError::from)
    }

    pub fn with_realtime_url(mut self, url: impl Into<String>) -> Self {
        self.realtime_url = Some(url.into());
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// A zero interval falls back to the default.
    pub fn poll_interval(&self) -> Duration {
        match self.poll_interval_ms {
            0 => DEFAULT_POLL_INTERVAL,
            ms => Duration::from_millis(ms),
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::default().with_poll_interval(self.poll_interval())
    }
}
