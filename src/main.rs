use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use jira_sync_agent::batch::{BatchOptions, BatchOrchestrator};
use jira_sync_agent::cache::CacheRegistry;
use jira_sync_agent::cli::{exit_code_for, Args};
use jira_sync_agent::config::{SqliteCredentialResolver, YamlCredentialResolver};
use jira_sync_agent::vector_store::NoopVectorStore;
use jira_sync_agent::watermark::WatermarkStore;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize file logging. Returns guard that must be held for duration of program.
fn init_logging() -> Option<WorkerGuard> {
  // Use XDG state directory, falling back to data directory
  let log_dir = dirs::state_dir()
    .or_else(dirs::data_dir)
    .map(|d| d.join("jira-sync-agent"))?;

  // Create directory if it doesn't exist
  std::fs::create_dir_all(&log_dir).ok()?;

  let file_appender = tracing_appender::rolling::daily(&log_dir, "jira-sync-agent.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
    .init();

  Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_logging();

  let args = Args::parse();

  if args.init_db {
    SqliteCredentialResolver::open(&args.watermark_db)?;
    println!("initialized watermark database at {}", args.watermark_db.display());
    return Ok(());
  }

  let resolver = YamlCredentialResolver::find_and_load(args.config.as_deref())?;
  let watermarks = WatermarkStore::open(&args.watermark_db)?;
  let cache_registry = CacheRegistry::new();
  let vector_store = NoopVectorStore::new();

  let orchestrator = BatchOrchestrator::new(&resolver, &watermarks, &cache_registry, &vector_store);
  let options = BatchOptions {
    parallel: args.parallel,
    max_workers: args.max_workers,
    force_full_sync: args.full_sync,
  };

  let report = if args.all_users {
    orchestrator.run_all_tenants(&options).await?
  } else {
    let tenant_ids = args.requested_tenant_ids();
    if tenant_ids.is_empty() {
      return Err(eyre!("no tenants selected: pass --user-id, --user-ids, or --all-users"));
    }
    orchestrator.run(&tenant_ids, &options).await
  };

  tracing::info!(
    total = report.total,
    successful = report.successful,
    failed = report.failed,
    skipped = report.skipped,
    issues_sum = report.issues_sum,
    chunks_sum = report.chunks_sum,
    duration_ms = report.duration.as_millis() as u64,
    "batch complete"
  );

  std::process::exit(exit_code_for(&report));
}
