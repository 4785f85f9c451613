//! HealthTrack client - fetch HealthTrack API resources from the terminal
//!
//! Requests go through the same cached client the application uses, so
//! repeated GETs within the TTL are answered without a network round trip.

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use healthtrack_client::cli::{Cli, Command};
use healthtrack_client::{ApiClient, ClientConfig, SessionStore};

/// Installs a stderr log subscriber honoring `RUST_LOG`, else the `-v` level
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let config = cli.client_config(ClientConfig::from_env());
    let session = SessionStore::open_default()?;
    let client = ApiClient::from_config(&config, session)?;

    match &cli.command {
        Command::Get { path, repeat, .. } => {
            let options = cli.command.get_options().unwrap_or_default();
            for _ in 0..*repeat {
                let response = client.cached_get::<Value>(path, options).await?;
                let source = if response.from_cache { "cache" } else { "network" };
                eprintln!("{} ({})", path, source);
                println!("{}", serde_json::to_string_pretty(&response.data)?);
            }
        }
        Command::Login { token } => {
            client.login(token)?;
            eprintln!("Token saved");
        }
        Command::Logout => {
            client.logout()?;
            eprintln!("Logged out");
        }
    }

    Ok(())
}
