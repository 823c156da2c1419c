mod config;
mod server;

use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;

use config::ServerConfig;
use server::GameServer;

#[derive(Parser)]
#[command(name = "cadence-server")]
#[command(about = "Cadence demo game server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = cadence::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 32)]
    max_clients: usize,

    #[arg(long, default_value_t = 2, help = "Broadcast state every N ticks")]
    state_send_rate: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let bind_addr = format!("{}:{}", args.bind, args.port);

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        max_clients: args.max_clients,
        state_send_rate: args.state_send_rate,
        ..Default::default()
    };

    let mut server = GameServer::new(&bind_addr, config)?;

    let running = server.running();
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;

    log::info!(
        "server listening on {} at {} ticks/s",
        server.local_addr(),
        args.tick_rate
    );
    server.run();
    log::info!("server shut down");

    Ok(())
}
