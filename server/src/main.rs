use clap::Parser;
use log::{error, info};
use pong_server::config::{ServerConfig, DEFAULT_INBOX_CAPACITY, DEFAULT_TICK_RATE};
use pong_server::network::Server;
use pong_shared::{Framing, ARENA_HEIGHT, ARENA_WIDTH, DEFAULT_PORT};
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value_t = DEFAULT_TICK_RATE)]
    tick_rate: u32,
    /// Delay before a power-up spawns, in milliseconds
    #[clap(long, default_value_t = 5000)]
    power_up_delay_ms: u64,
    /// Frames buffered per client before its reader waits
    #[clap(long, default_value_t = DEFAULT_INBOX_CAPACITY)]
    inbox_capacity: usize,
    /// Arena width in pixels
    #[clap(long, default_value_t = ARENA_WIDTH)]
    width: u32,
    /// Arena height in pixels
    #[clap(long, default_value_t = ARENA_HEIGHT)]
    height: u32,
    /// Frame boundaries on the wire: "newline" or "legacy"
    #[clap(long, default_value_t = Framing::Newline)]
    framing: Framing,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            tick_rate: args.tick_rate,
            power_up_delay: Duration::from_millis(args.power_up_delay_ms),
            inbox_capacity: args.inbox_capacity,
            arena_width: args.width,
            arena_height: args.height,
            framing: args.framing,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::from(Args::parse());
    info!(
        "Starting pong server on {} at {} Hz ({} framing)",
        config.address(),
        config.tick_rate,
        config.framing
    );

    let server = Server::bind(config).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
