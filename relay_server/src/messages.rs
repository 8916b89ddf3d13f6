use serde::{Deserialize, Serialize};

/// Frames exchanged with browser tabs over `/ws`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum RelayMessage {
    Subscribe { resource: String },
    Unsubscribe { resource: String },
    Changed { resource: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_frame() {
        let frame = serde_json::to_string(&RelayMessage::Changed {
            resource: "applications".to_string(),
        })
        .unwrap();
        assert_eq!(frame, r#"{"type":"changed","resource":"applications"}"#);
    }

    #[test]
    fn test_parse_client_frames() {
        let msg: RelayMessage =
            serde_json::from_str(r#"{"type":"subscribe","resource":"notifications"}"#).unwrap();
        assert_eq!(
            msg,
            RelayMessage::Subscribe {
                resource: "notifications".to_string()
            }
        );
        assert!(serde_json::from_str::<RelayMessage>(r#"{"type":"join","peer_id":"x"}"#).is_err());
    }
}
