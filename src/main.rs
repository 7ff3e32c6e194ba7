// Terminal client for a BLIP-2 inference backend.
//
// Select an image and ask about it, or send a text-only prompt; results
// accumulate in a session history. Theme and prompt drafts persist between
// runs in a small JSON state file.

mod api;
mod config;
mod controller;
mod error;
mod history;
mod notifications;
mod preview;
mod shell;
mod storage;
mod theme;
mod validation;
mod view;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::HttpBackend;
use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_PAGE_PATH};
use storage::{FileStorage, MemoryStorage};

#[derive(Parser, Debug)]
#[command(name = "blip2-client")]
#[command(version)]
#[command(about = "Image-to-text and text generation client for a BLIP-2 backend")]
struct Args {
    /// Backend base URL
    #[arg(long, env = "BLIP2_API_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Where theme and prompt drafts are stored
    #[arg(long, env = "BLIP2_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Keep theme and drafts in memory only
    #[arg(long, conflicts_with = "state_file")]
    ephemeral: bool,

    /// Default output path for the `render` command
    #[arg(long, default_value = DEFAULT_PAGE_PATH)]
    page: PathBuf,

    /// Seconds before a notification dismisses itself
    #[arg(long, default_value_t = 5)]
    notification_secs: u64,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let state_file = if self.ephemeral {
            None
        } else {
            self.state_file.or_else(config::default_state_file)
        };

        ClientConfig {
            base_url: self.base_url,
            state_file,
            page_path: self.page,
            notification_lifetime: Duration::from_secs(self.notification_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Args::parse().into_config();
    let backend = HttpBackend::new(&config.base_url).context("Invalid --base-url")?;

    match &config.state_file {
        Some(path) => {
            tracing::info!("Using state file {}", path.display());
            shell::run(&config, backend, FileStorage::open(path)).await
        }
        None => {
            tracing::info!("No state file, drafts will not persist");
            shell::run(&config, backend, MemoryStorage::new()).await
        }
    }
}
