use std::fmt;

/// Failure reported by a bus listener. It is logged by the bus and never reaches
/// the emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerError(String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        ListenerError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener failed: {}", self.0)
    }
}

impl std::error::Error for ListenerError {}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        ListenerError(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        ListenerError(message.to_string())
    }
}

impl From<serde_json::Error> for ListenerError {
    fn from(err: serde_json::Error) -> Self {
        ListenerError(err.to_string())
    }
}
