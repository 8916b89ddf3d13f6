use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Fetch(String),
    Storage(String),
    QuotaExceeded,
    StorageUnavailable,
    Realtime(String),
    Serialization(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Fetch(msg) => write!(f, "Fetch failed: {msg}"),
            SyncError::Storage(msg) => write!(f, "Storage Error: {msg}"),
            SyncError::QuotaExceeded => write!(f, "Storage quota exceeded"),
            SyncError::StorageUnavailable => write!(f, "Shared storage is unavailable"),
            SyncError::Realtime(msg) => write!(f, "Realtime Error: {msg}"),
            SyncError::Serialization(msg) => write!(f, "Serialization Error: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}

impl SyncError {
    pub fn fetch(message: impl Into<String>) -> Self {
        SyncError::Fetch(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        SyncError::Storage(message.into())
    }

    pub fn realtime(message: impl Into<String>) -> Self {
        SyncError::Realtime(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        SyncError::Serialization(message.into())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}
