//! vidfetch server binary
//!
//! Loads the optional TOML config, applies command-line overrides, and
//! serves the page and API until SIGINT/SIGTERM.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vidfetch::{Config, VideoFetcher};

/// Download online videos through a small web page
#[derive(Debug, Parser)]
#[command(name = "vidfetch", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "VIDFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides api.bind_address)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Parent directory for per-task scratch directories (overrides storage.scratch_root)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Path to the yt-dlp executable (overrides extractor.binary_path)
    #[arg(long = "yt-dlp")]
    yt_dlp: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> vidfetch::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.server.api.bind_address = bind;
        }
        if let Some(dir) = self.scratch_dir {
            config.storage.scratch_root = dir;
        }
        if let Some(path) = self.yt_dlp {
            config.extractor.binary_path = Some(path);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vidfetch=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Cli::parse().into_config()?;

    let fetcher = VideoFetcher::new(config.clone()).await?;

    vidfetch::api::start_api_server(Arc::new(fetcher), Arc::new(config)).await?;
    Ok(())
}
