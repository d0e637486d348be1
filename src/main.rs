use clap::{Parser, Subcommand};
use exn::ResultExt;
use scorestats::NoPerformance;
use scorestats::app;
use scorestats::error::{ErrorKind, Result};
use scorestats_config::Config;
use scorestats_db::Database;
use scorestats_models::ScoreItem;
use scorestats_queue::QueueBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Turns queued score submissions into persisted user statistics")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process queued scores until interrupted.
    Run {
        /// Exit once the queue is empty.
        #[arg(long)]
        stop_when_empty: bool,
        /// Process without persisting results.
        #[arg(long)]
        dry_run: bool,
    },
    /// Enqueue score items from a JSON file (a single item or an array).
    Push { file: PathBuf },
    /// Print the number of queued scores.
    Status,
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).map_err(|err| err.raise(ErrorKind::Config))?;
    if let Command::Run { stop_when_empty, dry_run } = &cli.command {
        config.queue.stop_when_empty |= *stop_when_empty;
        config.processing.dry_run |= *dry_run;
    }
    init_tracing(&config.log.filter);
    info!(version = env!("CARGO_PKG_VERSION"), queue = %config.queue.name, "starting scorestats");

    let db = app::connect(&config).await?;
    let result = match cli.command {
        Command::Run { .. } => run(&config, &db).await,
        Command::Push { file } => push(&*app::score_backend(&config, &db), config.queue.max_in_flight, &file).await,
        Command::Status => status(&*app::score_backend(&config, &db)).await,
    };
    db.close().await;
    result
}

async fn run(config: &Config, db: &Database) -> Result<()> {
    let queue = Arc::new(app::score_queue(config, db, Arc::new(NoPerformance), None).await?);
    let cancellation = CancellationToken::new();
    tokio::spawn({
        let cancellation = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, finishing current score");
                cancellation.cancel();
            }
        }
    });

    let failed = Arc::new(AtomicU64::new(0));
    let observer = {
        let failed = failed.clone();
        queue.subscribe(move |err, item| {
            failed.fetch_add(1, Ordering::Relaxed);
            error!(%item, retryable = err.is_retryable(), error = ?err, "score failed");
        })
    };
    let undecodable = {
        let failed = failed.clone();
        queue.subscribe_undecodable(move |err, payload| {
            failed.fetch_add(1, Ordering::Relaxed);
            error!(%payload, error = ?err, "dropped undecodable score item");
        })
    };
    queue.run(cancellation).await.map_err(|err| err.raise(ErrorKind::Startup("score queue")))?;
    queue.unsubscribe(observer);
    queue.unsubscribe_undecodable(undecodable);
    info!(processed = queue.total_processed(), failed = failed.load(Ordering::Relaxed), "done");
    Ok(())
}

/// Enqueue straight into the durable queue; no beatmap data is needed.
/// `max_in_flight` is checked against the backlog only, since the consumer
/// lives in another process.
async fn push(queue: &dyn QueueBackend<ScoreItem>, max_in_flight: Option<usize>, file: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(file).await.or_raise(|| ErrorKind::Startup("reading score file"))?;
    let items: Vec<ScoreItem> = match serde_json::from_str(&contents) {
        Ok(items) => items,
        Err(_) => vec![serde_json::from_str(&contents).or_raise(|| ErrorKind::InvalidScore(file.display().to_string()))?],
    };
    let mut pushed = 0;
    for item in items {
        let id = item.score.id;
        if let Some(max) = max_in_flight {
            let queued = queue.len().await.map_err(|err| err.raise(ErrorKind::Startup("score queue")))?;
            if queued >= max {
                warn!(score_id = id, queued, "queue is full, not enqueuing score");
                continue;
            }
        }
        if let Err(err) = queue.push(item).await {
            warn!(score_id = id, error = ?err, "failed to enqueue score");
            continue;
        }
        pushed += 1;
    }
    info!(pushed, "enqueued scores");
    println!("{pushed}");
    Ok(())
}

async fn status(queue: &dyn QueueBackend<ScoreItem>) -> Result<()> {
    let size = queue.len().await.map_err(|err| err.raise(ErrorKind::Startup("score queue")))?;
    println!("{size}");
    Ok(())
}
