use crate::ports::clock::ClockPort;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Default)]
pub struct Clock;

impl Clock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for Clock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as f64)
            .unwrap_or(0.0)
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_always_available() {
        assert!(Clock::new().is_available());
    }

    #[test]
    fn test_clock_now_returns_valid_unix_timestamp() {
        let timestamp = Clock::new().now();

        assert!(
            timestamp > 1_577_836_800_000.0,
            "Timestamp should be after 2020: {}",
            timestamp
        );
        assert!(
            timestamp < 4_102_444_800_000.0,
            "Timestamp should be before 2100: {}",
            timestamp
        );
    }

    #[test]
    fn test_clock_does_not_go_backwards() {
        let clock = Clock::new();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = clock.now();
        assert!(t2 >= t1, "Time should be monotonic (t1={}, t2={})", t1, t2);
    }
}
