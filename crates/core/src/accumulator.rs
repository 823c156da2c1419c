const STEP_GROWTH_FACTOR: f64 = 1.5;
const MAX_STEP_ADJUSTMENTS: u32 = 64;

/// Converts irregular wall-clock elapsed time into whole fixed-size
/// simulation steps, carrying the remainder forward.
///
/// Two drain policies exist. `drain_adaptive` coarsens the step when one
/// update consistently costs more real time than it simulates, so the loop
/// always makes forward progress. `drain_fixed` trusts an externally declared
/// step length, which networked peers need anyway to agree on simulated time.
#[derive(Debug, Clone)]
pub struct TimestepAccumulator {
    step: f64,
    balance: f64,
}

impl TimestepAccumulator {
    pub fn new(step: f64) -> Self {
        assert!(step > 0.0, "step duration must be positive, got {step}");
        Self { step, balance: 0.0 }
    }

    pub fn from_tick_rate(tick_rate: u32) -> Self {
        assert!(tick_rate > 0, "tick rate must be positive");
        Self::new(1.0 / tick_rate as f64)
    }

    /// Current step length in seconds.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Owed simulation time not yet consumed by a drain.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn set_step(&mut self, step: f64) {
        assert!(step > 0.0, "step duration must be positive, got {step}");
        self.step = step;
    }

    /// Adds wall-clock elapsed time to the balance.
    ///
    /// A negative elapsed time means the platform clock went backwards,
    /// which the loop cannot operate on top of.
    pub fn feed(&mut self, elapsed: f64) {
        assert!(elapsed >= 0.0, "clock went backwards: elapsed = {elapsed}");
        self.balance += elapsed;
    }

    /// Runs as many whole steps as the balance covers, coarsening the step
    /// first if `last_update_cost` shows the current granularity is
    /// unattainable in real time. Returns the number of steps taken.
    pub fn drain_adaptive<F: FnMut(f64)>(&mut self, last_update_cost: f64, mut update: F) -> u32 {
        let mut adjustments = 0;
        while self.step <= last_update_cost {
            self.step *= STEP_GROWTH_FACTOR;
            adjustments += 1;
            log::warn!(
                "update cost {:.4}s exceeds step; coarsening step to {:.4}s",
                last_update_cost,
                self.step
            );
            assert!(
                adjustments <= MAX_STEP_ADJUSTMENTS,
                "step adjustment did not converge after {MAX_STEP_ADJUSTMENTS} iterations"
            );
        }
        assert!(last_update_cost < self.step);

        let mut steps = 0;
        while self.balance >= self.step {
            update(self.step);
            self.balance -= self.step;
            steps += 1;
        }
        steps
    }

    /// Runs `floor(balance / step)` steps and subtracts their total cost in
    /// one operation, avoiding drift from repeated subtraction. Returns the
    /// number of steps taken.
    pub fn drain_fixed<F: FnMut(f64)>(&mut self, mut update: F) -> u32 {
        let steps = (self.balance / self.step).floor() as u32;
        for _ in 0..steps {
            update(self.step);
        }
        self.balance = (self.balance - steps as f64 * self.step).max(0.0);
        steps
    }

    /// Fractional leftover for interpolated rendering, clamped into [0, 1].
    ///
    /// The raw quotient can exceed 1.0 right after an adaptive coarsening
    /// leaves more than one step's worth of balance behind, so the clamp is
    /// part of the contract, not cosmetics.
    pub fn alpha(&self) -> f64 {
        (self.balance / self.step).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_and_drain_conserve_time() {
        let mut acc = TimestepAccumulator::new(0.01);
        let feeds = [0.025, 0.003, 0.017, 0.0, 0.049];

        let mut simulated = 0.0;
        for elapsed in feeds {
            acc.feed(elapsed);
            acc.drain_fixed(|dt| simulated += dt);
        }

        let total_fed: f64 = feeds.iter().sum();
        assert!((simulated + acc.balance() - total_fed).abs() < 1e-9);
    }

    #[test]
    fn balance_never_goes_negative() {
        let mut acc = TimestepAccumulator::new(0.01);
        for elapsed in [0.0199, 0.0001, 0.03, 0.0, 0.0099] {
            acc.feed(elapsed);
            acc.drain_fixed(|_| {});
            assert!(acc.balance() >= 0.0);
            acc.drain_adaptive(0.0, |_| {});
            assert!(acc.balance() >= 0.0);
        }
    }

    #[test]
    fn fixed_drain_is_deterministic() {
        let feeds = [0.013, 0.021, 0.008, 0.032, 0.016];

        let run = || {
            let mut acc = TimestepAccumulator::new(0.01);
            let mut counts = Vec::new();
            for elapsed in feeds {
                acc.feed(elapsed);
                counts.push(acc.drain_fixed(|_| {}));
            }
            (counts, acc.balance())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn fixed_drain_matches_worked_scenario() {
        let mut acc = TimestepAccumulator::new(0.01);

        acc.feed(0.025);
        let mut steps = 0;
        assert_eq!(acc.drain_fixed(|_| steps += 1), 2);
        assert_eq!(steps, 2);
        assert!((acc.balance() - 0.005).abs() < 1e-9);

        acc.feed(0.01);
        assert_eq!(acc.drain_fixed(|_| {}), 1);
        assert!((acc.balance() - 0.005).abs() < 1e-9);
    }

    #[test]
    fn adaptive_drain_coarsens_unattainable_step() {
        let mut acc = TimestepAccumulator::new(0.01);

        // 0.01 -> 0.015 -> 0.0225, which finally exceeds the 0.02 cost.
        acc.drain_adaptive(0.02, |_| {});
        assert!((acc.step() - 0.0225).abs() < 1e-9);
    }

    #[test]
    fn adaptive_adjustment_terminates_from_far_below() {
        let mut acc = TimestepAccumulator::new(0.001);
        acc.drain_adaptive(10.0, |_| {});
        assert!(acc.step() > 10.0);
    }

    #[test]
    fn empty_balance_takes_zero_steps() {
        let mut acc = TimestepAccumulator::new(0.01);
        assert_eq!(acc.drain_fixed(|_| panic!("no step expected")), 0);
        assert_eq!(acc.drain_adaptive(0.0, |_| panic!("no step expected")), 0);
    }

    #[test]
    fn alpha_is_clamped() {
        let mut acc = TimestepAccumulator::new(0.01);
        acc.feed(0.005);
        assert!((acc.alpha() - 0.5).abs() < 1e-9);

        acc.feed(0.1);
        assert!(acc.alpha() <= 1.0);
    }

    #[test]
    #[should_panic(expected = "clock went backwards")]
    fn negative_feed_panics() {
        let mut acc = TimestepAccumulator::new(0.01);
        acc.feed(-0.001);
    }

    #[test]
    #[should_panic(expected = "step duration must be positive")]
    fn zero_step_is_refused() {
        TimestepAccumulator::new(0.0);
    }
}
