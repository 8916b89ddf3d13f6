use crate::ports::LoggerPort;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;

/// Native logger forwarding to the `log` facade.
///
/// The host binary decides where records go (`env_logger` in tests and the relay).
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    timers: Mutex<HashMap<String, Instant>>,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }
}

impl LoggerPort for ConsoleLogger {
    fn log(&self, message: &str) {
        log::info!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }

    fn time(&self, label: &str) {
        self.timers.lock().insert(label.to_string(), Instant::now());
    }

    fn time_end(&self, label: &str) {
        match self.timers.lock().remove(label) {
            Some(started) => log::debug!("{label}: {:.3}ms", started.elapsed().as_secs_f64() * 1000.0),
            None => log::warn!("Timer '{label}' does not exist"),
        }
    }
}
