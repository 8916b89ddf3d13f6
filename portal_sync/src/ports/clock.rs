/// Port for accessing wall-clock time and performance measurement
pub trait ClockPort: Send + Sync {
    /// Returns the current timestamp in milliseconds since the Unix epoch
    fn now(&self) -> f64;

    /// Checks if performance timing is available
    fn is_available(&self) -> bool;
}
