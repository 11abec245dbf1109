//! Drives one `SyncCoordinator` run per tenant across a batch, either
//! sequentially or over a bounded worker pool, and aggregates the results.

use crate::cache::CacheRegistry;
use crate::config::{CredentialResolver, TenantConfig};
use crate::sync::coordinator::SyncCoordinator;
use crate::vector_store::VectorStore;
use crate::watermark::{BatchStatus, WatermarkStore};
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub enum TenantOutcomeKind {
  Success,
  Failed,
  Skipped,
}

#[derive(Debug, Clone)]
pub struct TenantResult {
  pub tenant_id: String,
  pub outcome: TenantOutcomeKind,
  pub issues_processed: usize,
  pub chunks_upserted: usize,
  pub error_message: Option<String>,
}

/// Aggregate result of one batch run across every requested tenant.
#[derive(Debug, Clone)]
pub struct BatchReport {
  pub total: usize,
  pub successful: usize,
  pub failed: usize,
  pub skipped: usize,
  pub issues_sum: usize,
  pub chunks_sum: usize,
  pub duration: Duration,
  pub results: Vec<TenantResult>,
}

pub struct BatchOptions {
  pub parallel: bool,
  pub max_workers: usize,
  pub force_full_sync: bool,
}

impl Default for BatchOptions {
  fn default() -> Self {
    Self {
      parallel: false,
      max_workers: 4,
      force_full_sync: false,
    }
  }
}

pub struct BatchOrchestrator<'a> {
  credentials: &'a dyn CredentialResolver,
  watermarks: &'a WatermarkStore,
  cache_registry: &'a CacheRegistry,
  vector_store: &'a dyn VectorStore,
}

impl<'a> BatchOrchestrator<'a> {
  pub fn new(
    credentials: &'a dyn CredentialResolver,
    watermarks: &'a WatermarkStore,
    cache_registry: &'a CacheRegistry,
    vector_store: &'a dyn VectorStore,
  ) -> Self {
    Self {
      credentials,
      watermarks,
      cache_registry,
      vector_store,
    }
  }

  /// Runs every tenant in `tenant_ids`, pre-filtering out those whose
  /// credentials lack an endpoint or token before any coordinator starts.
  #[instrument(skip(self, tenant_ids), fields(tenant_count = tenant_ids.len()))]
  pub async fn run(&self, tenant_ids: &[String], options: &BatchOptions) -> BatchReport {
    let started = Instant::now();
    let mut skipped = Vec::new();
    let mut runnable = Vec::new();

    for tenant_id in tenant_ids {
      match self.credentials.get(tenant_id).await {
        Ok(config) if config.is_configured() => runnable.push(tenant_id.clone()),
        _ => skipped.push(tenant_id.clone()),
      }
    }

    if !skipped.is_empty() {
      info!(skipped = ?skipped, "tenants skipped: missing endpoint or token");
    }

    let mut results: Vec<TenantResult> = skipped
      .into_iter()
      .map(|tenant_id| TenantResult {
        tenant_id,
        outcome: TenantOutcomeKind::Skipped,
        issues_processed: 0,
        chunks_upserted: 0,
        error_message: None,
      })
      .collect();

    let coordinator = SyncCoordinator::new(self.credentials, self.watermarks, self.cache_registry, self.vector_store);

    let sync_results: Vec<TenantResult> = if options.parallel {
      stream::iter(runnable.into_iter())
        .map(|tenant_id| {
          let coordinator = &coordinator;
          async move {
            let outcome = coordinator.run(&tenant_id, options.force_full_sync).await;
            to_tenant_result(outcome)
          }
        })
        .buffer_unordered(options.max_workers.max(1))
        .collect()
        .await
    } else {
      let mut out = Vec::with_capacity(runnable.len());
      for tenant_id in &runnable {
        let outcome = coordinator.run(tenant_id, options.force_full_sync).await;
        out.push(to_tenant_result(outcome));
      }
      out
    };

    results.extend(sync_results);

    let successful = results.iter().filter(|r| matches!(r.outcome, TenantOutcomeKind::Success)).count();
    let failed = results.iter().filter(|r| matches!(r.outcome, TenantOutcomeKind::Failed)).count();
    let skipped = results.iter().filter(|r| matches!(r.outcome, TenantOutcomeKind::Skipped)).count();
    let issues_sum = results.iter().map(|r| r.issues_processed).sum();
    let chunks_sum = results.iter().map(|r| r.chunks_upserted).sum();

    if failed > 0 {
      warn!(failed, "batch completed with tenant failures");
    }

    BatchReport {
      total: results.len(),
      successful,
      failed,
      skipped,
      issues_sum,
      chunks_sum,
      duration: started.elapsed(),
      results,
    }
  }

  /// Convenience entry point for `--all-users`.
  pub async fn run_all_tenants(&self, options: &BatchOptions) -> Result<BatchReport, crate::error::ConfigError> {
    let tenant_ids = self.credentials.all_tenant_ids().await?;
    Ok(self.run(&tenant_ids, options).await)
  }
}

fn to_tenant_result(outcome: crate::sync::coordinator::SyncOutcome) -> TenantResult {
  TenantResult {
    tenant_id: outcome.tenant_id,
    outcome: match outcome.status {
      BatchStatus::Success => TenantOutcomeKind::Success,
      BatchStatus::Failed => TenantOutcomeKind::Failed,
    },
    issues_processed: outcome.issues_processed,
    chunks_upserted: outcome.chunks_upserted,
    error_message: outcome.error_message,
  }
}
