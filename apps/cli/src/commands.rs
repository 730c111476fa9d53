//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use sectorwise_cache::TtlCache;
use sectorwise_clients::{AcademicApi, SectorApi};
use sectorwise_core::{RetrievalService, ServiceConfig};
use sectorwise_shared::{AppConfig, expand_path, init_config, load_config, resolve_sources};
use sectorwise_storage::Storage;
use tracing::info;

/// Database file name under the configured data directory.
const DB_FILE_NAME: &str = "sectorwise.db";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sectorwise — sector knowledge, kept fresh.
#[derive(Parser)]
#[command(
    name = "sectorwise",
    version,
    about = "Answer topic questions per subject sector and search the stored corpus.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Answer a question about a sector.
    Ask {
        /// Subject sector (case-sensitive key, e.g. "physics").
        sector: String,

        /// The question to answer.
        question: String,

        /// Serve stored content only; skip refresh and enrichment.
        #[arg(long)]
        offline: bool,
    },

    /// Ranked search over all stored topics.
    Search {
        /// Search query.
        query: String,

        /// Scoring preferences as a JSON object.
        #[arg(long)]
        prefs: Option<String>,
    },

    /// List stored sectors with their last-update age.
    Topics,

    /// Study-progress records.
    Progress {
        /// Progress subcommand.
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Show recent search history.
    History {
        /// Maximum number of records shown.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Progress subcommands.
#[derive(Subcommand)]
pub(crate) enum ProgressAction {
    /// Record a study session for a sector.
    Record {
        /// Sector studied.
        #[arg(long)]
        sector: String,

        /// Performance score for the session.
        #[arg(long)]
        performance: f64,

        /// Free-form session notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// List recorded sessions, newest first.
    List {
        /// Only show sessions for this sector.
        #[arg(long)]
        sector: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug,hyper=info,reqwest=info",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
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

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ask {
            sector,
            question,
            offline,
        } => cmd_ask(&sector, &question, offline).await,
        Command::Search { query, prefs } => cmd_search(&query, prefs.as_deref()).await,
        Command::Topics => cmd_topics().await,
        Command::Progress { action } => match action {
            ProgressAction::Record {
                sector,
                performance,
                notes,
            } => cmd_progress_record(&sector, performance, notes.as_deref()).await,
            ProgressAction::List { sector } => cmd_progress_list(sector.as_deref()).await,
        },
        Command::History { limit } => cmd_history(limit).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Resolve the database path from config.
fn db_path(config: &AppConfig) -> Result<PathBuf> {
    Ok(expand_path(&config.defaults.data_dir)?.join(DB_FILE_NAME))
}

/// Open the topic store for read-only style commands.
async fn open_storage(config: &AppConfig) -> Result<Storage> {
    Ok(Storage::open(&db_path(config)?).await?)
}

/// Explicit initialization phase: config, storage, cache, clients, and
/// the service object are all built before the command runs. No globals,
/// no lazy init.
async fn build_service(config: &AppConfig) -> Result<RetrievalService<SectorApi, AcademicApi>> {
    let sources = resolve_sources(config)?;

    let storage = open_storage(config).await?;
    let refresh = SectorApi::new(sources.api_url, sources.timeout_secs)?;
    let academic = AcademicApi::new(sources.academic_api_url, sources.timeout_secs)?;

    Ok(RetrievalService::new(
        storage,
        TtlCache::new(),
        refresh,
        academic,
        ServiceConfig::from(&config.retrieval),
    ))
}

/// Spinner for network-bound commands.
fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(sector: &str, question: &str, offline: bool) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    info!(sector, offline, "answering topic question");

    let progress = spinner("Retrieving content");
    let result = service.topic_content(question, sector, offline).await;
    progress.finish_and_clear();

    println!();
    println!("{}", result.answer);
    if let Some(link) = result.link {
        println!();
        println!("  Further reading: {link}");
    }
    println!();

    Ok(())
}

async fn cmd_search(query: &str, prefs: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config).await?;

    let preferences: Option<serde_json::Value> = match prefs {
        Some(raw) => {
            Some(serde_json::from_str(raw).map_err(|e| eyre!("invalid --prefs JSON: {e}"))?)
        }
        None => None,
    };

    info!(query, "searching topic corpus");

    let progress = spinner("Searching");
    let hits = service.search(query, preferences.as_ref()).await;
    progress.finish_and_clear();

    if hits.is_empty() {
        println!("No matching topics.");
        return Ok(());
    }

    println!();
    for (i, hit) in hits.iter().enumerate() {
        let snip = snippet(&hit.content, config.retrieval.snippet_chars);
        println!("  {}. {} (score {:.2})", i + 1, hit.sector, hit.score);
        println!("     {snip}");
    }
    println!();

    Ok(())
}

async fn cmd_topics() -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let topics = storage.list_topics().await?;
    if topics.is_empty() {
        println!("No stored topics yet. Run `sectorwise ask <sector> <question>` to fetch one.");
        return Ok(());
    }

    println!();
    for topic in topics {
        let age = chrono::Utc::now() - topic.last_update;
        println!(
            "  {}  (updated {} days ago)",
            topic.sector,
            age.num_days()
        );
    }
    println!();

    Ok(())
}

async fn cmd_progress_record(sector: &str, performance: f64, notes: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let id = storage.record_progress(sector, performance, notes).await?;
    info!(sector, performance, id = %id, "recorded study session");
    println!("Recorded session for '{sector}' (performance {performance:.2}).");

    Ok(())
}

async fn cmd_progress_list(sector: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let sessions = storage.list_progress(sector).await?;
    if sessions.is_empty() {
        println!("No recorded sessions.");
        return Ok(());
    }

    println!();
    for session in sessions {
        let notes = session.notes.as_deref().unwrap_or("-");
        println!(
            "  {}  {}  performance {:.2}  {notes}",
            session.last_study_date.format("%Y-%m-%d %H:%M"),
            session.sector,
            session.performance,
        );
    }
    println!();

    Ok(())
}

async fn cmd_history(limit: u32) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let records = storage.recent_searches(limit).await?;
    if records.is_empty() {
        println!("No search history.");
        return Ok(());
    }

    println!();
    for record in records {
        println!(
            "  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.query
        );
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Truncate content for display: at most `max_chars` characters, with a
/// trailing "..." when shortened.
fn snippet(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let head: String = content.chars().take(max_chars).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_short_content_untouched() {
        assert_eq!(snippet("short body", 200), "short body");
    }

    #[test]
    fn snippet_truncates_with_ellipsis() {
        let long = "x".repeat(250);
        let snip = snippet(&long, 200);
        assert_eq!(snip.chars().count(), 203);
        assert!(snip.ends_with("..."));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let content = "é".repeat(300);
        let snip = snippet(&content, 200);
        assert!(snip.ends_with("..."));
        assert_eq!(snip.chars().count(), 203);
    }
}
