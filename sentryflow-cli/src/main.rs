//! sentryflow-cli - Command-line client for SentryFlow
//!
//! One-shot commands against a running SentryFlow server.

mod commands;

use clap::{Parser, Subcommand};
use sentryflow_client::Client;
use std::net::{Ipv4Addr, SocketAddr};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sentryflow-cli")]
#[command(about = "Command-line client for the SentryFlow router daemon")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9000", env = "SENTRYFLOW_SERVER")]
    server: SocketAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping the server
    Ping {
        /// Payload to echo back
        #[arg(default_value = "ping")]
        payload: String,
    },

    /// Echo text off the server
    Echo {
        /// Text to echo
        text: String,
    },

    /// Fetch server statistics
    Stats,

    /// Install route records
    RouteUpdate {
        /// Route as prefix,mask,nextHop,metric (e.g. 10.0.0.0,8,10.0.0.1,10)
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,
    },

    /// Look up the best route for an address
    RouteLookup {
        /// IPv4 address to look up
        ip: Ipv4Addr,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut client = Client::connect(cli.server).await?;
    let output = commands::execute(&mut client, cli.command).await?;
    println!("{output}");

    client.close().await.ok();
    Ok(())
}
