//! fundlog binary.
//!
//! Reads `fundlog.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the JSON API or runs one of the bulk commands.
//!
//! ```text
//! fundlog serve
//! fundlog import funds.csv
//! fundlog import history.xlsx --sheet History
//! fundlog admin-import funds.csv --dry-run
//! fundlog export funds.csv
//! ```

mod config;

use std::{
  fs::File,
  io::{BufWriter, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use fundlog_import::{admin, import_history, read_rows};
use fundlog_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(name = "fundlog", author, version, about = "Fund metrics store with point-in-time history")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "fundlog.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Replay dated fund rows from a CSV or JSON file into the history.
  Import {
    file:  PathBuf,
    /// Sheet name or zero-based index (JSON and workbook sources).
    #[arg(long)]
    sheet: Option<String>,
  },
  /// Create or update funds by name; rows that change nothing are skipped.
  AdminImport {
    file:    PathBuf,
    /// Report what would change without writing.
    #[arg(long)]
    dry_run: bool,
  },
  /// Write every fund to a CSV file.
  Export { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?
    .with_history_limit(cfg.history_limit);

  match cli.command {
    Command::Serve => serve(store, &cfg).await,
    Command::Import { file, sheet } => import(&store, &file, sheet.as_deref()).await,
    Command::AdminImport { file, dry_run } => admin_import(&store, &file, dry_run).await,
    Command::Export { file } => export(&store, &file).await,
  }
}

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = fundlog_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// Only an unreadable source fails the command; per-fund failures are
/// printed and the exit status stays zero.
async fn import(store: &SqliteStore, file: &Path, sheet: Option<&str>) -> anyhow::Result<()> {
  let rows = read_rows(file, sheet).with_context(|| format!("failed to read {}", file.display()))?;
  let report = import_history(store, rows, Utc::now()).await;

  for fund in &report.funds {
    match &fund.result {
      Ok(imported) => {
        let verb = if imported.created { "Created" } else { "Updated" };
        println!("{verb} fund: {}", fund.name);
        println!(
          "Successfully imported {} historical records for {}",
          imported.rows, fund.name
        );
      }
      Err(e) => println!("Error importing {}: {e}", fund.name),
    }
  }

  let failed = report.failed().count();
  println!(
    "Imported {} of {} funds ({} failed, {} rows without a name skipped)",
    report.funds.len() - failed,
    report.funds.len(),
    failed,
    report.skipped_rows,
  );
  Ok(())
}

async fn admin_import(store: &SqliteStore, file: &Path, dry_run: bool) -> anyhow::Result<()> {
  let rows = read_rows(file, None).with_context(|| format!("failed to read {}", file.display()))?;
  let result = admin::import_funds(store, &rows, dry_run).await;

  for error in &result.errors {
    let name = error.name.as_deref().unwrap_or("<no name>");
    println!("Row {} ({name}): {}", error.line, error.error);
  }
  println!(
    "{}{} new, {} updated, {} skipped, {} errors",
    if dry_run { "[dry run] " } else { "" },
    result.new,
    result.updated,
    result.skipped,
    result.errors.len(),
  );
  Ok(())
}

async fn export(store: &SqliteStore, file: &Path) -> anyhow::Result<()> {
  let out = File::create(file).with_context(|| format!("failed to create {}", file.display()))?;
  let mut out = BufWriter::new(out);
  let count = admin::export_funds(store, &mut out).await?;
  out.flush().context("failed to flush export")?;
  println!("Exported {count} funds to {}", file.display());
  Ok(())
}
