//! pagevault CLI entry point.
//!
//! Subcommands drive the snapshot service. JSON results go to stdout;
//! logging goes to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagevault_client::{FetchClient, FetchConfig};
use pagevault_core::{AppConfig, ArchiveDb};
use pagevault_service::SnapshotService;

#[derive(Parser)]
#[command(name = "pagevault", about = "Versioned web page snapshot archive", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a URL and archive a new snapshot
    Take {
        url: String,

        /// Store the content under the shared public scope
        #[arg(long)]
        public: bool,

        /// Identity the snapshot is taken as
        #[arg(long, default_value = "anonymous")]
        user: String,
    },

    /// Print snapshot metadata (most recent, or an exact timestamp)
    Meta {
        url: String,

        /// Exact fetch timestamp in epoch millis
        #[arg(long)]
        ts: Option<i64>,

        /// Identity the read runs as
        #[arg(long, default_value = "anonymous")]
        user: String,
    },

    /// Print snapshot content (most recent, or an exact timestamp)
    Content {
        url: String,

        /// Exact fetch timestamp in epoch millis
        #[arg(long)]
        ts: Option<i64>,

        /// Identity the read runs as
        #[arg(long, default_value = "anonymous")]
        user: String,
    },

    /// List every archived fetch timestamp for a URL, newest first
    Timestamps {
        url: String,

        /// Identity the read runs as
        #[arg(long, default_value = "anonymous")]
        user: String,
    },

    /// Print metadata for all snapshots fetched at or after a timestamp
    History {
        url: String,

        /// Lower fetch-timestamp bound in epoch millis, inclusive
        #[arg(long)]
        since: i64,

        /// Identity the read runs as
        #[arg(long, default_value = "anonymous")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let db = ArchiveDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
    })?;
    let service = SnapshotService::new(db, fetcher);

    match cli.command {
        Command::Take { url, public, user } => match service.take_snapshot(&url, public, &user).await {
            Ok(meta) => print_json(&meta)?,
            Err(e) if e.is_fetch_failure() => {
                tracing::warn!("snapshot of {} failed: {}", url, e);
                anyhow::bail!("page not found: {url}");
            }
            Err(e) => return Err(e.into()),
        },
        Command::Meta { url, ts, user } => {
            let meta = match ts {
                Some(ts) => service.meta_at(&url, ts, &user).await?,
                None => service.meta(&url, &user).await?,
            };
            print_optional(meta.as_ref())?;
        }
        Command::Content { url, ts, user } => {
            let content = match ts {
                Some(ts) => service.content_at(&url, ts, &user).await?,
                None => service.content(&url, &user).await?,
            };
            print_optional(content.as_ref())?;
        }
        Command::Timestamps { url, user } => {
            let timestamps = service.timestamps(&url, &user).await?;
            print_json(&timestamps)?;
        }
        Command::History { url, since, user } => {
            let metas = service.meta_since(&url, since, &user).await?;
            print_json(&metas)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_optional<T: serde::Serialize>(value: Option<&T>) -> Result<()> {
    match value {
        Some(value) => print_json(value),
        None => {
            println!("null");
            Ok(())
        }
    }
}
