//! ArticleSync server — webhook receiver for article publish notifications.
//!
//! Accepts batches from the external notifier, acknowledges immediately, and
//! hands each batch to the pipeline worker through a bounded queue.

mod handlers;
mod router;
mod state;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

use articlesync_core::{BatchQueue, Pipeline};
use articlesync_shared::{load_config, load_config_from, validate_config};

use state::AppState;

/// ArticleSync webhook receiver.
#[derive(Parser)]
#[command(
    name = "articlesync-server",
    version,
    about = "Receive article publish notifications and sync content into knowledge bases.",
    long_about = None,
)]
struct Args {
    /// Path to the config file (defaults to ~/.articlesync/articlesync.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing based on CLI flags.
fn init_tracing(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match args.verbose {
        0 => "articlesync=info",
        1 => "articlesync=debug",
        _ => "articlesync=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match args.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(&args);

    // Fail fast on configuration defects; nothing ambient is read later.
    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    validate_config(&config)?;

    let pipeline = Pipeline::from_config(&config)?;
    let queue = BatchQueue::spawn(pipeline, config.server.queue_capacity);

    let app = router::build_router(AppState {
        queue,
        archive_dir: config.server.archive_dir.as_ref().map(PathBuf::from),
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "receiver listening");
    axum::serve(listener, app).await?;

    Ok(())
}
