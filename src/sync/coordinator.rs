//! Per-tenant sync state machine: Idle -> Loading -> Planning -> Fetching
//! -> Chunking -> Upserting -> Recording -> Terminal{Success|Failed}.
//!
//! One `SyncCoordinator::run` call drives one tenant start to finish on
//! whichever worker the orchestrator handed it to; there is no retry
//! inside a single run.

use crate::cache::{CacheRegistry, RequestCache};
use crate::chunker::{Chunk, IssueChunker};
use crate::config::{CredentialResolver, TenantConfig};
use crate::error::SyncError;
use crate::jira::gateway::{JiraGateway, DEFAULT_SEARCH_FIELDS};
use crate::query_planner::QueryPlanner;
use crate::vector_store::VectorStore;
use crate::watermark::{BatchStatus, WatermarkStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// The batch kind this coordinator records watermarks under. A single
/// fixed name: the core only ever runs one kind of sync.
pub const BATCH_KIND: &str = "jira_sync";

/// Page size used for every `search_issues` call; the `startAt` protocol
/// requires it to stay fixed across pages for one query.
const SEARCH_PAGE_SIZE: u64 = 100;

/// What one coordinator run produced, regardless of terminal status.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
  pub tenant_id: String,
  pub status: BatchStatus,
  pub issues_processed: usize,
  pub chunks_upserted: usize,
  pub error_message: Option<String>,
}

pub struct SyncCoordinator<'a> {
  credentials: &'a dyn CredentialResolver,
  watermarks: &'a WatermarkStore,
  cache_registry: &'a CacheRegistry,
  vector_store: &'a dyn VectorStore,
}

impl<'a> SyncCoordinator<'a> {
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

  #[instrument(skip(self), fields(tenant_id = %tenant_id))]
  pub async fn run(&self, tenant_id: &str, force_full_sync: bool) -> SyncOutcome {
    match self.run_inner(tenant_id, force_full_sync).await {
      Ok(outcome) => outcome,
      Err(err) => {
        warn!(tenant_id, error = %err, "sync terminated with failure");
        let now = Utc::now();
        if let Err(record_err) = self.watermarks.record(tenant_id, BATCH_KIND, now, BatchStatus::Failed, 0, Some(&err.to_string())) {
          warn!(tenant_id, error = %record_err, "failed to record watermark after sync failure");
        }
        SyncOutcome {
          tenant_id: tenant_id.to_string(),
          status: BatchStatus::Failed,
          issues_processed: 0,
          chunks_upserted: 0,
          error_message: Some(err.to_string()),
        }
      }
    }
  }

  /// Writes the Recording-stage watermark, logging and swallowing any
  /// `WatermarkError` instead of propagating it: a write failure here must
  /// not downgrade a sync that already completed its real work.
  fn record_watermark(&self, tenant_id: &str, status: BatchStatus, processed_count: u64, error_message: Option<&str>) {
    if let Err(err) = self.watermarks.record(tenant_id, BATCH_KIND, Utc::now(), status, processed_count, error_message) {
      warn!(tenant_id, error = %err, "failed to record watermark; sync status unaffected");
    }
  }

  async fn run_inner(&self, tenant_id: &str, force_full_sync: bool) -> Result<SyncOutcome, SyncError> {
    // Loading
    let started = Instant::now();
    let config: TenantConfig = self.credentials.get(tenant_id).await?;
    config.validate()?;
    info!(tenant_id, elapsed_ms = started.elapsed().as_millis() as u64, "loading complete");

    // Planning
    let stage_started = Instant::now();
    let watermark = self.watermarks.get(tenant_id, BATCH_KIND)?;
    let jql = QueryPlanner::plan(&config, watermark.as_ref(), force_full_sync);
    info!(
      tenant_id,
      elapsed_ms = stage_started.elapsed().as_millis() as u64,
      "planning complete"
    );

    // Fetching
    let stage_started = Instant::now();
    let endpoint = config.endpoint.clone();
    let token = config.token.clone();
    let request_timeout = config.request_timeout;
    let cache: Arc<RequestCache> = self.cache_registry.get_or_create(tenant_id, move || {
      JiraGateway::new(&endpoint, &token, request_timeout).expect("gateway config already validated")
    });

    if !cache.test_connection().await {
      return Err(SyncError::JiraConnect(format!("could not reach Jira endpoint for tenant {tenant_id}")));
    }

    let issues = cache
      .search_issues(&jql, SEARCH_PAGE_SIZE, DEFAULT_SEARCH_FIELDS)
      .await
      .map_err(SyncError::Gateway)?;
    info!(
      tenant_id,
      issue_count = issues.len(),
      elapsed_ms = stage_started.elapsed().as_millis() as u64,
      "fetching complete"
    );

    if issues.is_empty() {
      self.record_watermark(tenant_id, BatchStatus::Success, 0, None);
      return Ok(SyncOutcome {
        tenant_id: tenant_id.to_string(),
        status: BatchStatus::Success,
        issues_processed: 0,
        chunks_upserted: 0,
        error_message: None,
      });
    }

    // Chunking
    let stage_started = Instant::now();
    let now = Utc::now().to_rfc3339();
    let mut chunks: Vec<Chunk> = Vec::new();
    for issue in &issues {
      chunks.extend(IssueChunker::chunk(issue, &config.endpoint, &now));
    }
    info!(
      tenant_id,
      chunk_count = chunks.len(),
      elapsed_ms = stage_started.elapsed().as_millis() as u64,
      "chunking complete"
    );

    // Upserting
    let stage_started = Instant::now();
    let upserted = self
      .vector_store
      .upsert(&chunks)
      .await
      .map_err(|e| SyncError::StoreUnreachable(e.to_string()))?;
    info!(
      tenant_id,
      upserted,
      elapsed_ms = stage_started.elapsed().as_millis() as u64,
      "upserting complete"
    );

    // Recording. A write failure here is logged but does not change the
    // terminal status already determined by the earlier stages — the
    // issues were fetched, chunked, and upserted successfully regardless
    // of whether the watermark row made it to disk.
    self.record_watermark(tenant_id, BatchStatus::Success, issues.len() as u64, None);

    Ok(SyncOutcome {
      tenant_id: tenant_id.to_string(),
      status: BatchStatus::Success,
      issues_processed: issues.len(),
      chunks_upserted: upserted,
      error_message: None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TenantConfig;
  use crate::error::ConfigError;
  use crate::vector_store::NoopVectorStore;
  use async_trait::async_trait;
  use std::collections::{BTreeMap, BTreeSet};
  use std::time::Duration;

  struct FixedResolver(TenantConfig);

  #[async_trait]
  impl CredentialResolver for FixedResolver {
    async fn get(&self, tenant_id: &str) -> Result<TenantConfig, ConfigError> {
      if tenant_id == self.0.tenant_id {
        Ok(self.0.clone())
      } else {
        Err(ConfigError::MissingCredentials {
          tenant_id: tenant_id.to_string(),
        })
      }
    }

    async fn all_tenant_ids(&self) -> Result<Vec<String>, ConfigError> {
      Ok(vec![self.0.tenant_id.clone()])
    }
  }

  fn unconfigured_tenant() -> TenantConfig {
    TenantConfig {
      tenant_id: "t1".into(),
      endpoint: String::new(),
      token: String::new(),
      projects: BTreeSet::new(),
      labels: BTreeMap::new(),
      jql: None,
      request_timeout: Duration::from_secs(30),
    }
  }

  #[tokio::test]
  async fn missing_credentials_yields_failed_outcome_and_records_watermark() {
    let resolver = FixedResolver(unconfigured_tenant());
    let watermarks = WatermarkStore::open_in_memory().unwrap();
    let registry = CacheRegistry::new();
    let vector_store = NoopVectorStore::new();
    let coordinator = SyncCoordinator::new(&resolver, &watermarks, &registry, &vector_store);

    let outcome = coordinator.run("t1", false).await;
    assert_eq!(outcome.status, BatchStatus::Failed);
    assert!(outcome.error_message.is_some());

    let wm = watermarks.get("t1", BATCH_KIND).unwrap().unwrap();
    assert_eq!(wm.status, BatchStatus::Failed);
  }

  #[tokio::test]
  async fn unknown_tenant_fails_at_loading_without_panicking() {
    let resolver = FixedResolver(unconfigured_tenant());
    let watermarks = WatermarkStore::open_in_memory().unwrap();
    let registry = CacheRegistry::new();
    let vector_store = NoopVectorStore::new();
    let coordinator = SyncCoordinator::new(&resolver, &watermarks, &registry, &vector_store);

    let outcome = coordinator.run("ghost", false).await;
    assert_eq!(outcome.status, BatchStatus::Failed);
  }
}
