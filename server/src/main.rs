use clap::Parser;
use server::network::Server;
use std::time::Duration;

/// Parses command-line arguments and runs the arena server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "9000")]
        port: u16,
        /// Simulation tick rate (updates per second)
        #[clap(short, long, default_value_t = shared::SERVER_TICK_RATE)]
        tick_rate: u32,
    }

    env_logger::init();
    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate as f32);

    let mut server = Server::new(&address, tick_duration).await?;
    server.run().await
}
