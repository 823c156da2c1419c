use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use cadence::{Clock, FramePacer, Pipeline, TimestepAccumulator, TimingReporter, World};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target_fps: u32,
    pub tick_rate: u32,
    pub bodies: u32,
    pub run_seconds: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            tick_rate: 100,
            bodies: 3,
            run_seconds: None,
        }
    }
}

/// Standalone loop owner. Uses the adaptive accumulator because nothing
/// declares an upper bound on one update's cost up front; the loop discovers
/// it and coarsens the step when it cannot keep up.
pub struct App {
    pacer: FramePacer,
    accumulator: TimestepAccumulator,
    reporter: TimingReporter,
    world: World,
    running: Arc<AtomicBool>,
    last_update_cost: f64,
    deadline: Option<f64>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let clock = Clock::new();

        let mut world = World::new();
        for i in 0..config.bodies {
            world.spawn(Vec3::new(i as f32 * 0.5, 3.0 + i as f32, 0.0));
        }

        Self {
            pacer: FramePacer::new(clock, config.target_fps),
            accumulator: TimestepAccumulator::from_tick_rate(config.tick_rate),
            reporter: TimingReporter::default(),
            world,
            running: Arc::new(AtomicBool::new(true)),
            last_update_cost: 0.0,
            deadline: config.run_seconds.map(|s| clock.now() + s),
        }
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn run(&mut self) {
        let mut pipeline = Pipeline::new(self.pacer.clock());
        pipeline.push("collect-frame-info", Self::collect_frame_info);
        pipeline.push("poll-inputs", Self::poll_inputs);
        pipeline.push("run-accumulator", Self::run_accumulator);
        pipeline.push("sleep-till-end-of-frame", Self::sleep_till_end_of_frame);
        pipeline.run(self);

        log::info!("app loop stopped after {} simulated ticks", self.world.tick());
    }

    fn collect_frame_info(&mut self) -> bool {
        if let Some(sample) = self.pacer.begin_frame() {
            self.accumulator.feed(sample.elapsed);
            if let Some(report) = self.reporter.record(sample) {
                log::info!("{report}");
            }
        }
        true
    }

    fn poll_inputs(&mut self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            log::info!("shutdown requested");
            return false;
        }
        if let Some(deadline) = self.deadline {
            if self.pacer.clock().now() >= deadline {
                log::info!("run duration reached");
                return false;
            }
        }
        true
    }

    fn run_accumulator(&mut self) -> bool {
        let clock = self.pacer.clock();

        let update_start = clock.now();
        let world = &mut self.world;
        let steps = self
            .accumulator
            .drain_adaptive(self.last_update_cost, |dt| world.step(dt as f32));
        let update_time = clock.now() - update_start;
        if steps > 0 {
            self.last_update_cost = update_time / steps as f64;
        }

        let render_start = clock.now();
        self.render(self.accumulator.alpha() as f32);
        let render_time = clock.now() - render_start;

        let frame = self.pacer.frame_mut();
        frame.number_of_updates = steps;
        frame.time_update_actual = if steps > 0 { update_time } else { 0.0 };
        frame.time_render_actual = render_time;
        true
    }

    /// Headless render: trace the first body's interpolated position.
    fn render(&self, alpha: f32) {
        let Some(body) = self.world.bodies().first() else {
            return;
        };
        let step = self.accumulator.step() as f32;
        let projected = body.position + body.velocity * (alpha * step);
        log::trace!(
            "render tick {} alpha {alpha:.2} body0 {projected:.2?}",
            self.world.tick()
        );
    }

    fn sleep_till_end_of_frame(&mut self) -> bool {
        self.pacer.sleep_to_frame_end();
        true
    }
}
