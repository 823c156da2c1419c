use crate::clock::Clock;
use crate::timing::FrameTiming;

/// Frame bookkeeping shared by every loop owner: opens and closes the
/// per-iteration `FrameTiming` record and paces iterations against an
/// absolute schedule anchored at the loop start, so repeated relative sleeps
/// cannot accumulate drift.
pub struct FramePacer {
    clock: Clock,
    frame: FrameTiming,
    loop_start: f64,
    iteration: u64,
    started: bool,
}

impl FramePacer {
    pub fn new(clock: Clock, target_fps: u32) -> Self {
        assert!(target_fps > 0, "target fps must be positive");
        Self {
            clock,
            frame: FrameTiming::new(1.0 / target_fps as f64),
            loop_start: clock.now(),
            iteration: 0,
            started: false,
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn target_frame_seconds(&self) -> f64 {
        self.frame.time_frame_expected
    }

    /// Changes the FPS lock at runtime. The schedule anchor is re-based so
    /// the absolute frame targets stay meaningful under the new cadence.
    ///
    /// The shipped binaries fix their rate at startup via the CLI; this is
    /// the hook a runtime toggle (debug key, console command) attaches to.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        assert!(target_fps > 0, "target fps must be positive");
        self.frame.time_frame_expected = 1.0 / target_fps as f64;
        self.loop_start = self.clock.now();
        self.iteration = 0;
    }

    /// Mutable access to the in-flight frame record, for owners filling in
    /// update counts and sub-phase durations.
    pub fn frame_mut(&mut self) -> &mut FrameTiming {
        &mut self.frame
    }

    /// Closes the previous iteration's record and opens the next one.
    /// Returns the finished sample, or `None` on the first call when there
    /// is no previous frame to collect.
    pub fn begin_frame(&mut self) -> Option<FrameTiming> {
        let now = self.clock.now();
        let sample = self.started.then(|| self.frame.finish(now));
        self.started = true;
        self.frame.begin(now);
        sample
    }

    /// Sleeps until the absolute end of the current frame slot. A frame that
    /// overran its budget gets no catch-up correction here; the overrun is
    /// returned as lost time and left to the accumulator's carry-forward.
    pub fn sleep_to_frame_end(&mut self) -> f64 {
        self.iteration += 1;
        let target = self.loop_start + self.iteration as f64 * self.frame.time_frame_expected;
        let remaining = target - self.clock.now();

        if remaining > 0.0 {
            self.clock.sleep(remaining);
            return 0.0;
        }

        let lost = -remaining;
        log::debug!("frame overran its budget by {:.3}ms", lost * 1000.0);
        lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_begin_has_no_sample_to_collect() {
        let mut pacer = FramePacer::new(Clock::new(), 60);
        assert!(pacer.begin_frame().is_none());
        assert!(pacer.begin_frame().is_some());
    }

    #[test]
    fn collected_sample_has_non_negative_elapsed() {
        let mut pacer = FramePacer::new(Clock::new(), 60);
        pacer.begin_frame();
        let sample = pacer.begin_frame().unwrap();
        assert!(sample.elapsed >= 0.0);
        assert_eq!(sample.time_frame_expected, 1.0 / 60.0);
    }

    #[test]
    fn sleep_paces_toward_the_absolute_schedule() {
        let clock = Clock::new();
        let start = clock.now();
        let mut pacer = FramePacer::new(clock, 200);

        pacer.begin_frame();
        pacer.sleep_to_frame_end();
        pacer.begin_frame();
        pacer.sleep_to_frame_end();

        // Two 5ms frame slots must take at least 10ms in total.
        assert!(clock.now() - start >= 2.0 * (1.0 / 200.0));
    }

    #[test]
    fn overrun_reports_lost_time_without_sleeping() {
        let clock = Clock::new();
        let mut pacer = FramePacer::new(clock, 1000);

        pacer.begin_frame();
        clock.sleep(0.005);
        // The 1ms slot is long gone; the pacer must not block further.
        let lost = pacer.sleep_to_frame_end();
        assert!(lost > 0.0);
    }

    #[test]
    fn changing_fps_rebases_the_anchor() {
        let mut pacer = FramePacer::new(Clock::new(), 60);
        pacer.begin_frame();
        pacer.sleep_to_frame_end();

        pacer.set_target_fps(30);
        assert_eq!(pacer.target_frame_seconds(), 1.0 / 30.0);

        pacer.begin_frame();
        let lost = pacer.sleep_to_frame_end();
        assert_eq!(lost, 0.0);
    }
}
