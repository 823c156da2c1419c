/// Per-iteration timing record produced by the collect stage and consumed by
/// the telemetry reporter.
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    pub time_start: f64,
    pub time_end: f64,
    pub elapsed: f64,
    /// Target seconds per frame. Mutable at runtime, always positive.
    pub time_frame_expected: f64,
    /// Simulation steps executed this iteration.
    pub number_of_updates: u32,
    pub time_update_actual: f64,
    pub time_render_actual: f64,
}

impl FrameTiming {
    pub fn new(time_frame_expected: f64) -> Self {
        assert!(
            time_frame_expected > 0.0,
            "target frame duration must be positive, got {time_frame_expected}"
        );
        Self {
            time_start: 0.0,
            time_end: 0.0,
            elapsed: 0.0,
            time_frame_expected,
            number_of_updates: 0,
            time_update_actual: 0.0,
            time_render_actual: 0.0,
        }
    }

    /// Opens a fresh record for the iteration starting at `time_start`,
    /// zeroing every per-iteration field so nothing stale leaks into frames
    /// that do no update or render work.
    pub fn begin(&mut self, time_start: f64) {
        self.time_start = time_start;
        self.time_end = time_start;
        self.elapsed = 0.0;
        self.number_of_updates = 0;
        self.time_update_actual = 0.0;
        self.time_render_actual = 0.0;
    }

    /// Closes the record at `time_end` and returns the finished sample.
    pub fn finish(&mut self, time_end: f64) -> FrameTiming {
        self.time_end = time_end;
        self.elapsed = time_end - self.time_start;
        assert!(self.elapsed >= 0.0, "clock went backwards across a frame");
        *self
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}
