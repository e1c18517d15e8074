use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use policy_desk::{app, config::AppConfig};

/// Insurance policy and client desk
#[derive(Debug, Parser)]
#[command(name = "policy-desk", version, about)]
struct Cli {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides POLICY_DESK_HOST)")]
    host: Option<String>,

    #[arg(long, help = "SQLite URL, e.g. sqlite://data.db (overrides DATABASE_URL)")]
    database_url: Option<String>,

    #[arg(long, help = "Directory for uploaded reports (overrides UPLOAD_DIR)")]
    upload_dir: Option<PathBuf>,

    #[arg(long, help = "Directory of the browser UI (overrides PUBLIC_DIR)")]
    public_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(dir) = self.upload_dir {
            config.storage.upload_dir = dir;
        }
        if let Some(dir) = self.public_dir {
            config.storage.public_dir = dir;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, UPLOAD_DIR, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("policy_desk=info,tower_http=info")),
        )
        .init();

    let config = Cli::parse().apply(policy_desk::config::config().clone());
    tracing::info!("Starting policy-desk in {:?} mode", config.environment);

    app::serve(&config).await
}
