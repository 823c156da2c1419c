use std::thread;
use std::time::{Duration, Instant};

const CALIBRATION_ROUNDS: u32 = 8;
const CALIBRATION_SLEEP: Duration = Duration::from_millis(1);

/// Monotonic time source for the loop core.
///
/// Readings are seconds since the clock was created. `sleep` compensates for
/// OS scheduler granularity: it under-sleeps by the overshoot measured at
/// startup, then spins for the remainder.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
    sleep_overshoot: f64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            sleep_overshoot: measure_sleep_overshoot(),
        }
    }

    /// Seconds since the clock's epoch. Never decreases.
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    pub fn sleep(&self, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }

        let deadline = self.now() + seconds;

        let coarse = seconds - self.sleep_overshoot;
        if coarse > 0.0 {
            thread::sleep(Duration::from_secs_f64(coarse));
        }

        while self.now() < deadline {
            std::hint::spin_loop();
        }
    }

    /// The per-machine sleep overshoot measured at startup, in seconds.
    pub fn sleep_overshoot(&self) -> f64 {
        self.sleep_overshoot
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

fn measure_sleep_overshoot() -> f64 {
    let requested = CALIBRATION_SLEEP.as_secs_f64();
    let mut total = 0.0;

    for _ in 0..CALIBRATION_ROUNDS {
        let start = Instant::now();
        thread::sleep(CALIBRATION_SLEEP);
        total += (start.elapsed().as_secs_f64() - requested).max(0.0);
    }

    total / CALIBRATION_ROUNDS as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_are_monotonic() {
        let clock = Clock::new();
        let mut previous = clock.now();
        for _ in 0..100 {
            let reading = clock.now();
            assert!(reading >= previous);
            previous = reading;
        }
    }

    #[test]
    fn sleep_waits_at_least_the_requested_time() {
        let clock = Clock::new();
        let start = clock.now();
        clock.sleep(0.005);
        assert!(clock.now() - start >= 0.005);
    }

    #[test]
    fn sleep_ignores_non_positive_durations() {
        let clock = Clock::new();
        let start = clock.now();
        clock.sleep(0.0);
        clock.sleep(-1.0);
        assert!(clock.now() - start < 0.1);
    }
}
