//! Index-Relay main entry point
//!
//! This is the command-line interface for Index-Relay. It plays the role of
//! the external trigger process: it resolves one settings snapshot, builds
//! the components, and invokes a single library entry point per run. A cron
//! entry calling `scan` hourly and `cleanup-logs` daily reproduces the
//! scheduled behavior.

use anyhow::Context;
use clap::{Parser, Subcommand};
use index_relay::auth::TokenCache;
use index_relay::client::{build_http_client, IndexingClient, InspectionClient};
use index_relay::config::{load_settings, Settings};
use index_relay::scheduler::BatchScheduler;
use index_relay::state::{ActionType, SubmissionSource};
use index_relay::store::{SharedItemStore, SharedLogSink, SqliteStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Index-Relay: search-engine indexing submitter and status checker
///
/// Index-Relay submits page URLs to the Google Indexing API, inspects their
/// coverage through the Search Console URL Inspection API, and re-verifies
/// tracked items in rate-limited batches.
#[derive(Parser, Debug)]
#[command(name = "index-relay")]
#[command(version = "1.0.0")]
#[command(about = "Search-engine indexing submitter and status checker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a URL change notification to the indexing endpoint
    Submit {
        /// The URL to submit
        url: String,

        /// Action type (URL_UPDATED or URL_DELETED); anything else is
        /// treated as URL_UPDATED
        #[arg(long)]
        action: Option<String>,

        /// Item ID to update on success (resolved from the URL if omitted)
        #[arg(long)]
        item_id: Option<i64>,
    },

    /// Inspect a URL's coverage state
    Inspect {
        /// The URL to inspect
        url: String,

        /// Item ID to write the result back to
        #[arg(long)]
        item_id: Option<i64>,
    },

    /// Run one scheduled-scan tick
    Scan,

    /// Register a URL for tracking
    Track {
        /// The canonical URL of the item
        url: String,

        /// Item type used by the scan allow-list
        #[arg(long, default_value = "post")]
        item_type: String,
    },

    /// Show submission log entries
    Logs {
        /// Filter by source (auto or manual)
        #[arg(long)]
        source: Option<String>,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Entries per page
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },

    /// Delete submission log entries older than the given number of days
    CleanupLogs {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration and resolve the settings snapshot
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let settings = Arc::new(
        load_settings(&cli.config)
            .with_context(|| format!("failed to load {}", cli.config.display()))?,
    );

    if let Some(fingerprint) = &settings.credential_fingerprint {
        tracing::debug!("Using credential {}", &fingerprint[..12.min(fingerprint.len())]);
    }

    let store = Arc::new(Mutex::new(
        SqliteStore::new(std::path::Path::new(&settings.database_path))
            .context("failed to open store database")?,
    ));

    match cli.command {
        Command::Submit {
            url,
            action,
            item_id,
        } => handle_submit(settings, store, &url, action.as_deref(), item_id).await?,
        Command::Inspect { url, item_id } => {
            handle_inspect(settings, store, &url, item_id).await?
        }
        Command::Scan => handle_scan(settings, store).await?,
        Command::Track { url, item_type } => handle_track(store, &url, &item_type)?,
        Command::Logs {
            source,
            page,
            per_page,
        } => handle_logs(store, source.as_deref(), page, per_page)?,
        Command::CleanupLogs { days } => handle_cleanup_logs(store, days)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("index_relay=info,warn"),
            1 => EnvFilter::new("index_relay=debug,info"),
            2 => EnvFilter::new("index_relay=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the submit subcommand
async fn handle_submit(
    settings: Arc<Settings>,
    store: Arc<Mutex<SqliteStore>>,
    url: &str,
    action: Option<&str>,
    item_id: Option<i64>,
) -> anyhow::Result<()> {
    let action = match action {
        Some(s) => ActionType::from_str_lossy(s),
        None => settings.default_action,
    };

    let http = build_http_client()?;
    let tokens = Arc::new(TokenCache::new(http.clone()));
    let item_store: SharedItemStore = store.clone();
    let log: SharedLogSink = store;
    let indexer = IndexingClient::new(http, settings, tokens, item_store, log);

    let accepted = indexer
        .submit(url, action, SubmissionSource::Manual, item_id)
        .await?;

    if accepted {
        println!("Accepted: {} ({})", url, action);
    } else {
        println!("Rejected: {} ({}) - see logs for the response", url, action);
    }
    Ok(())
}

/// Handles the inspect subcommand
async fn handle_inspect(
    settings: Arc<Settings>,
    store: Arc<Mutex<SqliteStore>>,
    url: &str,
    item_id: Option<i64>,
) -> anyhow::Result<()> {
    let http = build_http_client()?;
    let tokens = Arc::new(TokenCache::new(http.clone()));
    let item_store: SharedItemStore = store;
    let inspector = InspectionClient::new(http, settings, tokens, item_store);

    let inspection = inspector.inspect(url, item_id).await?;
    println!("{}: {}", url, inspection.status);
    tracing::debug!(
        "Raw inspection response: {}",
        serde_json::to_string_pretty(&inspection.raw).unwrap_or_default()
    );
    Ok(())
}

/// Handles the scan subcommand: one scheduler tick
async fn handle_scan(
    settings: Arc<Settings>,
    store: Arc<Mutex<SqliteStore>>,
) -> anyhow::Result<()> {
    let http = build_http_client()?;
    let tokens = Arc::new(TokenCache::new(http.clone()));
    let item_store: SharedItemStore = store;
    let inspector = InspectionClient::new(
        http,
        settings.clone(),
        tokens,
        item_store.clone(),
    );
    let scheduler = BatchScheduler::new(settings, inspector, item_store);

    let summary = scheduler.run_tick().await?;
    println!(
        "Scan tick: {} selected, {} inspected, {} skipped, {} failed",
        summary.selected, summary.inspected, summary.skipped, summary.failed
    );
    Ok(())
}

/// Handles the track subcommand
fn handle_track(
    store: Arc<Mutex<SqliteStore>>,
    url: &str,
    item_type: &str,
) -> anyhow::Result<()> {
    let mut store = store.lock().unwrap();
    let id = store.track_item(url, item_type, chrono::Utc::now())?;
    println!("Tracking {} as item {}", url, id);
    Ok(())
}

/// Handles the logs subcommand
fn handle_logs(
    store: Arc<Mutex<SqliteStore>>,
    source: Option<&str>,
    page: usize,
    per_page: usize,
) -> anyhow::Result<()> {
    let source = source.map(SubmissionSource::from_str_lossy);
    let store = store.lock().unwrap();
    let total = store.count_logs(source)?;
    let logs = store.get_logs(per_page, page, source)?;

    println!("{} log entries (page {} of {})", total, page, total.div_ceil(per_page.max(1) as u64));
    for entry in logs {
        println!(
            "[{}] {} {} {} ({}) {}",
            entry.created_at, entry.status_code, entry.action_type, entry.url, entry.source, entry.message
        );
    }
    Ok(())
}

/// Handles the cleanup-logs subcommand
fn handle_cleanup_logs(store: Arc<Mutex<SqliteStore>>, days: u32) -> anyhow::Result<()> {
    let mut store = store.lock().unwrap();
    let deleted = store.cleanup_old_logs(days)?;
    println!("Deleted {} log entries older than {} days", deleted, days);
    Ok(())
}
