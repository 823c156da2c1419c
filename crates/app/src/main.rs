mod app;

use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;

use app::{App, AppConfig};

#[derive(Parser)]
#[command(name = "cadence-app")]
#[command(about = "Standalone fixed-timestep loop demo")]
struct Args {
    #[arg(short, long, default_value_t = 60, help = "Target frames per second")]
    fps: u32,

    #[arg(short, long, default_value_t = 100, help = "Initial simulation tick rate")]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 3, help = "Number of bodies to simulate")]
    bodies: u32,

    #[arg(long, help = "Stop after this many seconds")]
    duration: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AppConfig {
        target_fps: args.fps,
        tick_rate: args.tick_rate,
        bodies: args.bodies,
        run_seconds: args.duration,
    };

    let mut app = App::new(config);

    let running = app.running();
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;

    log::info!(
        "app loop starting: {} fps target, {} tick rate, {} bodies",
        args.fps,
        args.tick_rate,
        args.bodies
    );
    app.run();

    Ok(())
}
