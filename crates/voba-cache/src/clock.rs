use std::sync::Mutex;
use std::time::Duration;

/// Wall-clock source in fractional seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 { chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0 }
}

/// Test clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock { now: Mutex<f64> }

impl ManualClock {
    pub fn new(start: f64) -> Self { Self { now: Mutex::new(start) } }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() { *now += by.as_secs_f64(); }
    }

    pub fn set(&self, to: f64) {
        if let Ok(mut now) = self.now.lock() { *now = to; }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 { self.now.lock().map(|n| *n).unwrap_or(0.0) }
}
