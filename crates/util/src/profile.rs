use log::debug;
use web_time::{Duration, Instant};

/// Utility struct to measure the time taken by a scope
/// and log it when the struct is dropped.
/// Usage:
/// ```
/// use xpak_util::profile::Measure;
/// {
///     let _measure = Measure::new("Some operation");
///     // Some operation to measure
/// }
/// ```
/// When the scope ends, the time taken by the operation will be logged.
pub struct Measure(String, Instant);

impl Measure {
    pub fn new(message: impl Into<String>) -> Self {
        Measure(message.into(), Instant::now())
    }

    /// Time passed since the measure was started
    pub fn elapsed(&self) -> Duration {
        self.1.elapsed()
    }
}

impl Drop for Measure {
    fn drop(&mut self) {
        debug!("{} in {:?}", self.0, self.1.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_elapsed_grows() {
        let measure = Measure::new("Sleeping");
        std::thread::sleep(Duration::from_millis(10));
        assert!(measure.elapsed() >= Duration::from_millis(10));
    }
}
