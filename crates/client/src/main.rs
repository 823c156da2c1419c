mod client;
mod config;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;

use client::GameClient;
use config::ClientConfig;

#[derive(Parser)]
#[command(name = "cadence-client")]
#[command(about = "Cadence demo game client")]
struct Args {
    #[arg(
        short,
        long,
        help = "Server address to connect to (e.g., 127.0.0.1:27100)"
    )]
    server: String,

    #[arg(short, long, default_value_t = 60, help = "Target frames per second")]
    fps: u32,

    #[arg(short, long, default_value_t = cadence::DEFAULT_TICK_RATE,
          help = "Server tick rate; must match the server")]
    tick_rate: u32,

    #[arg(long, help = "Stop after this many seconds")]
    duration: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let server_addr: SocketAddr = args.server.parse()?;

    let config = ClientConfig {
        target_fps: args.fps,
        tick_rate: args.tick_rate,
        run_seconds: args.duration,
        ..Default::default()
    };

    let mut client = GameClient::new(server_addr, config)?;

    let running = client.running();
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;

    client.run();

    Ok(())
}
