//! Command-line surface for the sync runner.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jira-sync")]
#[command(about = "Multi-tenant Jira sync engine with an LLM tool-calling agent")]
#[command(version)]
pub struct Args {
  /// Path to the tenant credentials store (YAML). Falls back to
  /// `./tenants.yaml`, then `$XDG_CONFIG_HOME/jira-sync-agent/tenants.yaml`.
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// Path to the local watermark database (SQLite).
  #[arg(long, default_value = "watermarks.db")]
  pub watermark_db: PathBuf,

  /// Sync a single tenant.
  #[arg(long)]
  pub user_id: Option<String>,

  /// Sync a comma-separated list of tenants.
  #[arg(long, value_delimiter = ',')]
  pub user_ids: Vec<String>,

  /// Sync every tenant the credentials store knows about.
  #[arg(long)]
  pub all_users: bool,

  /// Run tenants over a bounded worker pool instead of sequentially.
  #[arg(long)]
  pub parallel: bool,

  /// Worker pool size when `--parallel` is set.
  #[arg(long, default_value_t = 4)]
  pub max_workers: usize,

  /// Ignore the watermark and resync the last 7 days regardless.
  #[arg(long)]
  pub full_sync: bool,

  /// Create the watermark database's schema and exit, without syncing.
  #[arg(long)]
  pub init_db: bool,
}

impl Args {
  /// Resolves the tenant id list the caller asked for, without touching
  /// the credentials store (that happens in `BatchOrchestrator`'s
  /// `--all-users` path).
  pub fn requested_tenant_ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.user_ids.clone();
    if let Some(single) = &self.user_id {
      ids.push(single.clone());
    }
    ids
  }
}

/// Process exit code matching the batch outcome: all successful -> 0,
/// all failed (or CLI misuse) -> 1, partial success -> 2.
pub fn exit_code_for(report: &crate::batch::BatchReport) -> i32 {
  if report.total == 0 {
    return 1;
  }
  let non_skipped = report.total - report.skipped;
  if non_skipped == 0 {
    return 1;
  }
  if report.failed == 0 {
    0
  } else if report.successful == 0 {
    1
  } else {
    2
  }
}
