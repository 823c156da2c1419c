use std::fmt;

use crate::ring::FrameSampleRing;
use crate::timing::FrameTiming;

/// Rolling frame-timing aggregation shared by every loop owner.
///
/// Samples accumulate in a ring so the window is bounded; a report is emitted
/// every 100 frames when the target rate is above 60 FPS, otherwise every
/// `target_fps` frames (roughly once per second). The ring itself is never
/// reset between reports.
pub struct TimingReporter {
    ring: FrameSampleRing,
    frames_since_report: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TimingReport {
    pub frames: u32,
    pub avg_elapsed: f64,
    pub avg_fps: f64,
    pub avg_updates: f64,
    pub avg_update_time: f64,
    pub avg_render_time: f64,
}

impl TimingReporter {
    pub const DEFAULT_CAPACITY: usize = 128;

    pub fn new(capacity: usize) -> Self {
        Self {
            ring: FrameSampleRing::new(capacity),
            frames_since_report: 0,
        }
    }

    pub fn ring(&self) -> &FrameSampleRing {
        &self.ring
    }

    /// Absorbs one frame sample and returns a report when the cadence for
    /// the sample's target frame rate comes due.
    pub fn record(&mut self, sample: FrameTiming) -> Option<TimingReport> {
        self.ring.push(sample);
        self.frames_since_report += 1;

        if self.frames_since_report < report_interval(sample.time_frame_expected) {
            return None;
        }
        self.frames_since_report = 0;

        let avg_elapsed = self.ring.average(|s| s.elapsed)?;
        Some(TimingReport {
            frames: self.ring.len() as u32,
            avg_elapsed,
            avg_fps: if avg_elapsed > 0.0 {
                1.0 / avg_elapsed
            } else {
                0.0
            },
            avg_updates: self.ring.average(|s| s.number_of_updates as f64)?,
            avg_update_time: self.ring.average(|s| s.time_update_actual)?,
            avg_render_time: self.ring.average(|s| s.time_render_actual)?,
        })
    }
}

impl Default for TimingReporter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} fps avg over {} frames (frame {:.2}ms, update {:.2}ms x{:.1}, render {:.2}ms)",
            self.avg_fps,
            self.frames,
            self.avg_elapsed * 1000.0,
            self.avg_update_time * 1000.0,
            self.avg_updates,
            self.avg_render_time * 1000.0,
        )
    }
}

fn report_interval(time_frame_expected: f64) -> u32 {
    let target_fps = 1.0 / time_frame_expected;
    if target_fps > 60.0 {
        100
    } else {
        (target_fps.round() as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(target_fps: f64, elapsed: f64) -> FrameTiming {
        FrameTiming {
            elapsed,
            number_of_updates: 1,
            ..FrameTiming::new(1.0 / target_fps)
        }
    }

    #[test]
    fn interval_follows_target_rate() {
        assert_eq!(report_interval(1.0 / 144.0), 100);
        assert_eq!(report_interval(1.0 / 60.0), 60);
        assert_eq!(report_interval(1.0 / 30.0), 30);
        assert_eq!(report_interval(2.0), 1);
    }

    #[test]
    fn report_emitted_once_per_interval() {
        let mut reporter = TimingReporter::new(64);

        for _ in 0..29 {
            assert!(reporter.record(sample(30.0, 0.033)).is_none());
        }
        let report = reporter.record(sample(30.0, 0.033)).unwrap();
        assert_eq!(report.frames, 30);
        assert!((report.avg_elapsed - 0.033).abs() < 1e-9);

        // The cadence counter restarts but the ring keeps its window.
        assert!(reporter.record(sample(30.0, 0.033)).is_none());
        assert_eq!(reporter.ring().len(), 31);
    }

    #[test]
    fn report_averages_fps() {
        let mut reporter = TimingReporter::new(256);

        let mut last = None;
        for _ in 0..100 {
            if let Some(report) = reporter.record(sample(120.0, 0.010)) {
                last = Some(report);
            }
        }

        let report = last.expect("one report after 100 frames at >60 fps");
        assert!((report.avg_fps - 100.0).abs() < 1.0);
    }
}
