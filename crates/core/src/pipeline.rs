use crate::clock::Clock;

/// One named step of the frame pipeline.
///
/// Stages time themselves with explicit start/end readings, so a stage's
/// elapsed time is valid from the very first iteration.
pub struct LoopStage<O> {
    name: &'static str,
    run: Box<dyn FnMut(&mut O) -> bool>,
    time_start: f64,
    time_elapsed: f64,
}

impl<O> LoopStage<O> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn time_start(&self) -> f64 {
        self.time_start
    }

    pub fn time_elapsed(&self) -> f64 {
        self.time_elapsed
    }
}

/// Ordered sequence of stages executed once per loop iteration.
///
/// Stages are appended during setup and never removed or reordered. A stage
/// returning `false` stops the loop at the next stage boundary; there is no
/// other exit and no mid-stage preemption.
pub struct Pipeline<O> {
    clock: Clock,
    stages: Vec<LoopStage<O>>,
    iterations: u64,
}

/// How often the driver logs the per-stage time breakdown.
const STAGE_REPORT_INTERVAL: u64 = 300;

impl<O> Pipeline<O> {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            stages: Vec::new(),
            iterations: 0,
        }
    }

    pub fn push(&mut self, name: &'static str, run: impl FnMut(&mut O) -> bool + 'static) {
        self.stages.push(LoopStage {
            name,
            run: Box::new(run),
            time_start: 0.0,
            time_elapsed: 0.0,
        });
    }

    pub fn stages(&self) -> &[LoopStage<O>] {
        &self.stages
    }

    /// Runs every stage once, in insertion order. Returns false when a stage
    /// signalled stop.
    pub fn run_iteration(&mut self, owner: &mut O) -> bool {
        for stage in &mut self.stages {
            stage.time_start = self.clock.now();
            let keep_running = (stage.run)(owner);
            stage.time_elapsed = self.clock.now() - stage.time_start;

            if !keep_running {
                log::debug!("stage '{}' requested stop", stage.name);
                return false;
            }
        }
        true
    }

    /// Per-stage elapsed times from the most recent iteration, one
    /// `name time` pair per stage.
    pub fn stage_summary(&self) -> String {
        self.stages
            .iter()
            .map(|stage| format!("{} {:.2}ms", stage.name, stage.time_elapsed * 1000.0))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The loop driver: iterates until a stage signals stop, logging the
    /// stage breakdown at a fixed iteration cadence.
    pub fn run(&mut self, owner: &mut O) {
        while self.run_iteration(owner) {
            self.iterations += 1;
            if self.iterations % STAGE_REPORT_INTERVAL == 0 {
                log::debug!("stage times: {}", self.stage_summary());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_run_in_insertion_order_exactly_once() {
        let mut pipeline: Pipeline<Vec<&'static str>> = Pipeline::new(Clock::new());
        for name in ["a", "b", "c", "d"] {
            pipeline.push(name, move |trace: &mut Vec<&'static str>| {
                trace.push(name);
                true
            });
        }

        let mut trace = Vec::new();
        assert!(pipeline.run_iteration(&mut trace));
        assert_eq!(trace, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn stop_signal_halts_iteration_at_stage_boundary() {
        let mut pipeline: Pipeline<Vec<&'static str>> = Pipeline::new(Clock::new());
        pipeline.push("first", |trace: &mut Vec<&'static str>| {
            trace.push("first");
            true
        });
        pipeline.push("stopper", |trace: &mut Vec<&'static str>| {
            trace.push("stopper");
            false
        });
        pipeline.push("unreached", |trace: &mut Vec<&'static str>| {
            trace.push("unreached");
            true
        });

        let mut trace = Vec::new();
        assert!(!pipeline.run_iteration(&mut trace));
        assert_eq!(trace, vec!["first", "stopper"]);
    }

    #[test]
    fn every_stage_reports_non_negative_elapsed() {
        let mut pipeline: Pipeline<u32> = Pipeline::new(Clock::new());
        pipeline.push("work", |count: &mut u32| {
            *count += 1;
            true
        });
        pipeline.push("last", |_: &mut u32| true);

        let mut count = 0;
        assert!(pipeline.run_iteration(&mut count));

        for stage in pipeline.stages() {
            assert!(stage.time_elapsed() >= 0.0, "stage {}", stage.name());
        }
    }

    #[test]
    fn stage_summary_names_every_stage() {
        let mut pipeline: Pipeline<u32> = Pipeline::new(Clock::new());
        pipeline.push("poll", |_: &mut u32| true);
        pipeline.push("update", |_: &mut u32| true);

        let mut owner = 0;
        assert!(pipeline.run_iteration(&mut owner));

        let summary = pipeline.stage_summary();
        assert!(summary.contains("poll"));
        assert!(summary.contains("update"));
        assert!(summary.contains("ms"));
    }

    #[test]
    fn driver_loops_until_stop() {
        let mut pipeline: Pipeline<u32> = Pipeline::new(Clock::new());
        pipeline.push("count-to-five", |count: &mut u32| {
            *count += 1;
            *count < 5
        });

        let mut count = 0;
        pipeline.run(&mut count);
        assert_eq!(count, 5);
    }
}
