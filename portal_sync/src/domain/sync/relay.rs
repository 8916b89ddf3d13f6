use serde::{Deserialize, Serialize};

/// Messages exchanged with the realtime relay over WebSocket.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayMessage {
    Subscribe { resource: String },
    Unsubscribe { resource: String },
    Changed { resource: String },
}

impl RelayMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// `Some(resource)` when the message announces a change.
    pub fn changed_resource(&self) -> Option<&str> {
        match self {
            RelayMessage::Changed { resource } => Some(resource),
            _ => None,
        }
    }
}
