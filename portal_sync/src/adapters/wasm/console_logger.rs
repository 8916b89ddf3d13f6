use crate::ports::LoggerPort;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = time)]
    fn console_time(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = timeEnd)]
    fn console_time_end(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    fn console_warn(s: &str);
}

const PREFIX: &str = "[portal-sync]";

/// Browser console logger. Messages are prefixed so they can be filtered in devtools.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn new() -> Self {
        Self
    }
}

impl LoggerPort for ConsoleLogger {
    fn log(&self, message: &str) {
        console_log(&format!("{PREFIX} {message}"));
    }

    fn error(&self, message: &str) {
        console_error(&format!("{PREFIX} {message}"));
    }

    fn warn(&self, message: &str) {
        console_warn(&format!("{PREFIX} {message}"));
    }

    fn time(&self, label: &str) {
        console_time(label);
    }

    fn time_end(&self, label: &str) {
        console_time_end(label);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_logger_all_methods() {
        let logger = ConsoleLogger::new();
        logger.log("test log");
        logger.warn("test warn");
        logger.error("test error");
        logger.time("test_timer");
        logger.time_end("test_timer");
    }
}
