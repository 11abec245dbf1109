//! Typed error taxonomy for the sync engine and the agent surface.
//!
//! Each subsystem boundary gets its own `thiserror` enum carrying enough
//! structured context (tenant id, HTTP status, tool name) to log without
//! re-parsing a message string. The CLI boundary wraps all of these in
//! `color_eyre::Result` for human-readable reporting.

use thiserror::Error;

/// Errors raised while resolving a tenant's configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("tenant {tenant_id} has no configured Jira credentials")]
  MissingCredentials { tenant_id: String },

  #[error("tenant {tenant_id} has an invalid JQL override: {reason}")]
  InvalidJqlConfig { tenant_id: String, reason: String },

  #[error("failed to read credentials store: {0}")]
  Store(String),
}

/// Errors raised by `JiraGateway` while talking to the Jira REST API.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("JQL syntax error: {message}")]
  JqlSyntax { message: String },

  #[error("authentication failed (401)")]
  AuthFailed,

  #[error("forbidden (403)")]
  Forbidden,

  #[error("not found (404)")]
  NotFound,

  #[error("Jira server error ({status})")]
  ServerError { status: u16 },

  #[error("request timed out")]
  Timeout,

  #[error("network error: {0}")]
  Network(String),
}

impl GatewayError {
  /// Classifies a raw HTTP status code plus optional server-provided body
  /// into the gateway's error taxonomy.
  pub fn from_status(status: u16, body: &str) -> Self {
    match status {
      400 => GatewayError::JqlSyntax {
        message: body.to_string(),
      },
      401 => GatewayError::AuthFailed,
      403 => GatewayError::Forbidden,
      404 => GatewayError::NotFound,
      500..=599 => GatewayError::ServerError { status },
      _ => GatewayError::Network(format!("unexpected status {status}: {body}")),
    }
  }
}

impl From<reqwest::Error> for GatewayError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      GatewayError::Timeout
    } else {
      GatewayError::Network(e.to_string())
    }
  }
}

/// Errors raised while persisting or reading watermark rows.
#[derive(Debug, Error)]
pub enum WatermarkError {
  #[error("watermark store unreachable: {0}")]
  Store(String),
}

/// Errors raised by the per-tenant vector-store upsert contract.
#[derive(Debug, Error)]
pub enum VectorStoreError {
  #[error("vector store unreachable: {0}")]
  Unreachable(String),

  #[error("failed to upsert chunk {chunk_id}: {message}")]
  ChunkUpsertFailed { chunk_id: String, message: String },
}

/// Terminal failure reasons for one `SyncCoordinator` run.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("could not reach Jira: {0}")]
  JiraConnect(String),

  #[error(transparent)]
  Gateway(#[from] GatewayError),

  #[error("vector store is unreachable, sync aborted: {0}")]
  StoreUnreachable(String),

  #[error(transparent)]
  Watermark(#[from] WatermarkError),
}

/// Errors surfaced by `AgentLoop` and `ToolRegistry`.
#[derive(Debug, Error)]
pub enum AgentError {
  #[error("unknown tool: {name}")]
  ToolNotFound { name: String },

  #[error("tool {name} failed: {message}")]
  ToolExecution { name: String, message: String },

  #[error("agent loop exceeded max_iterations ({max_iterations})")]
  MaxIterationsExceeded { max_iterations: usize },

  #[error("agent turn exceeded its timeout")]
  Timeout,

  #[error("language model call failed: {0}")]
  ModelError(String),
}
