//! Tenant configuration: the `TenantConfig` snapshot and the
//! `CredentialResolver` contract that produces it from the (external)
//! credentials store.

use crate::error::ConfigError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable per-sync snapshot. Created by a `CredentialResolver` at sync
/// start and discarded at sync end; never shared across tenants.
#[derive(Debug, Clone)]
pub struct TenantConfig {
  pub tenant_id: String,
  pub endpoint: String,
  pub token: String,
  pub projects: BTreeSet<String>,
  /// project -> labels. An empty set means "all labels for that project".
  pub labels: BTreeMap<String, BTreeSet<String>>,
  pub jql: Option<String>,
  pub request_timeout: Duration,
}

impl TenantConfig {
  /// Validates the invariants from the data model: at least one of
  /// `projects` or `jql` is non-empty; `endpoint` and `token` are non-empty.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.endpoint.is_empty() || self.token.is_empty() {
      return Err(ConfigError::MissingCredentials {
        tenant_id: self.tenant_id.clone(),
      });
    }
    if self.projects.is_empty() && self.jql.as_deref().unwrap_or("").is_empty() {
      return Err(ConfigError::InvalidJqlConfig {
        tenant_id: self.tenant_id.clone(),
        reason: "neither projects nor a raw jql override is configured".to_string(),
      });
    }
    Ok(())
  }

  /// `true` when both endpoint and token are present, mirroring the
  /// pre-filter `BatchOrchestrator` applies before starting any coordinator.
  pub fn is_configured(&self) -> bool {
    !self.endpoint.is_empty() && !self.token.is_empty()
  }
}

/// Reads `{endpoint, token, projects, labels, jql}` for a tenant from the
/// external credentials store. The core never decrypts; implementations are
/// expected to hand back plaintext tokens already.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
  async fn get(&self, tenant_id: &str) -> Result<TenantConfig, ConfigError>;

  /// All tenant ids this resolver knows about, used by `--all-users`.
  async fn all_tenant_ids(&self) -> Result<Vec<String>, ConfigError>;
}

// ---------------------------------------------------------------------------
// YAML-backed resolver, for local/dev use and tests.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct YamlTenant {
  endpoint: String,
  token: String,
  #[serde(default)]
  projects: BTreeSet<String>,
  #[serde(default)]
  labels: BTreeMap<String, BTreeSet<String>>,
  #[serde(default)]
  jql: Option<String>,
  #[serde(default)]
  request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct YamlTenants {
  #[serde(default)]
  tenants: BTreeMap<String, YamlTenant>,
}

pub struct YamlCredentialResolver {
  tenants: BTreeMap<String, YamlTenant>,
}

impl YamlCredentialResolver {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| ConfigError::Store(format!("failed to read {}: {e}", path.display())))?;
    let parsed: YamlTenants = serde_yaml::from_str(&contents)
      .map_err(|e| ConfigError::Store(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Self {
      tenants: parsed.tenants,
    })
  }

  /// Search order matching this lineage's existing config lookup: explicit
  /// path, then `./tenants.yaml`, then `$XDG_CONFIG_HOME/jira-sync-agent/tenants.yaml`.
  pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(p) = explicit_path {
      return Self::load(p);
    }
    let local = PathBuf::from("tenants.yaml");
    if local.exists() {
      return Self::load(&local);
    }
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jira-sync-agent").join("tenants.yaml");
      if xdg_path.exists() {
        return Self::load(&xdg_path);
      }
    }
    Err(ConfigError::Store(
      "no tenants.yaml found; pass --config or create ~/.config/jira-sync-agent/tenants.yaml"
        .to_string(),
    ))
  }
}

#[async_trait]
impl CredentialResolver for YamlCredentialResolver {
  async fn get(&self, tenant_id: &str) -> Result<TenantConfig, ConfigError> {
    let t = self
      .tenants
      .get(tenant_id)
      .ok_or_else(|| ConfigError::MissingCredentials {
        tenant_id: tenant_id.to_string(),
      })?;
    Ok(TenantConfig {
      tenant_id: tenant_id.to_string(),
      endpoint: t.endpoint.clone(),
      token: t.token.clone(),
      projects: t.projects.clone(),
      labels: t.labels.clone(),
      jql: t.jql.clone(),
      request_timeout: Duration::from_secs(t.request_timeout_secs.unwrap_or(30)),
    })
  }

  async fn all_tenant_ids(&self) -> Result<Vec<String>, ConfigError> {
    Ok(self.tenants.keys().cloned().collect())
  }
}

// ---------------------------------------------------------------------------
// SQLite-backed resolver, matching this lineage's own embedded-database idiom.
// ---------------------------------------------------------------------------

/// Reads tenant credentials from a local `credentials` table. One row per
/// tenant; `projects`/`labels` are stored as JSON text since SQLite has no
/// native set/map column type.
pub struct SqliteCredentialResolver {
  conn: std::sync::Mutex<rusqlite::Connection>,
}

const CREDENTIALS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    tenant_id TEXT PRIMARY KEY,
    endpoint TEXT NOT NULL,
    token TEXT NOT NULL,
    projects TEXT NOT NULL DEFAULT '[]',
    labels TEXT NOT NULL DEFAULT '{}',
    jql TEXT,
    request_timeout_secs INTEGER NOT NULL DEFAULT 30
);
"#;

impl SqliteCredentialResolver {
  pub fn open(path: &Path) -> Result<Self, ConfigError> {
    let conn = rusqlite::Connection::open(path)
      .map_err(|e| ConfigError::Store(format!("failed to open {}: {e}", path.display())))?;
    conn
      .execute_batch(CREDENTIALS_SCHEMA)
      .map_err(|e| ConfigError::Store(format!("failed to run migrations: {e}")))?;
    Ok(Self {
      conn: std::sync::Mutex::new(conn),
    })
  }

  /// Inserts or replaces one tenant's row. Exposed for `--init-db` tooling
  /// and tests; the core only ever reads through `CredentialResolver`.
  pub fn upsert_tenant(&self, config: &TenantConfig) -> Result<(), ConfigError> {
    let conn = self.conn.lock().map_err(|e| ConfigError::Store(e.to_string()))?;
    let projects_json = serde_json::to_string(&config.projects)
      .map_err(|e| ConfigError::Store(e.to_string()))?;
    let labels_json =
      serde_json::to_string(&config.labels).map_err(|e| ConfigError::Store(e.to_string()))?;
    conn
      .execute(
        "INSERT INTO credentials (tenant_id, endpoint, token, projects, labels, jql, request_timeout_secs)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(tenant_id) DO UPDATE SET
           endpoint = excluded.endpoint,
           token = excluded.token,
           projects = excluded.projects,
           labels = excluded.labels,
           jql = excluded.jql,
           request_timeout_secs = excluded.request_timeout_secs",
        rusqlite::params![
          config.tenant_id,
          config.endpoint,
          config.token,
          projects_json,
          labels_json,
          config.jql,
          config.request_timeout.as_secs(),
        ],
      )
      .map_err(|e| ConfigError::Store(e.to_string()))?;
    Ok(())
  }
}

#[async_trait]
impl CredentialResolver for SqliteCredentialResolver {
  async fn get(&self, tenant_id: &str) -> Result<TenantConfig, ConfigError> {
    let conn = self.conn.lock().map_err(|e| ConfigError::Store(e.to_string()))?;
    let row = conn
      .query_row(
        "SELECT endpoint, token, projects, labels, jql, request_timeout_secs
         FROM credentials WHERE tenant_id = ?1",
        rusqlite::params![tenant_id],
        |row| {
          Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, u64>(5)?,
          ))
        },
      )
      .map_err(|_| ConfigError::MissingCredentials {
        tenant_id: tenant_id.to_string(),
      })?;

    let (endpoint, token, projects_json, labels_json, jql, timeout_secs) = row;
    let projects: BTreeSet<String> =
      serde_json::from_str(&projects_json).map_err(|e| ConfigError::Store(e.to_string()))?;
    let labels: BTreeMap<String, BTreeSet<String>> =
      serde_json::from_str(&labels_json).map_err(|e| ConfigError::Store(e.to_string()))?;

    if endpoint.is_empty() || token.is_empty() {
      return Err(ConfigError::MissingCredentials {
        tenant_id: tenant_id.to_string(),
      });
    }

    Ok(TenantConfig {
      tenant_id: tenant_id.to_string(),
      endpoint,
      token,
      projects,
      labels,
      jql,
      request_timeout: Duration::from_secs(timeout_secs),
    })
  }

  async fn all_tenant_ids(&self) -> Result<Vec<String>, ConfigError> {
    let conn = self.conn.lock().map_err(|e| ConfigError::Store(e.to_string()))?;
    let mut stmt = conn
      .prepare("SELECT tenant_id FROM credentials ORDER BY tenant_id")
      .map_err(|e| ConfigError::Store(e.to_string()))?;
    let ids = stmt
      .query_map([], |row| row.get::<_, String>(0))
      .map_err(|e| ConfigError::Store(e.to_string()))?
      .filter_map(|r| r.ok())
      .collect();
    Ok(ids)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_temp_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(contents.as_bytes()).expect("write");
    f
  }

  #[tokio::test]
  async fn resolves_known_tenant() {
    let f = write_temp_yaml(
      r#"
tenants:
  t1:
    endpoint: "https://example.atlassian.net"
    token: "secret"
    projects: ["BTVO"]
    labels:
      BTVO: ["NCMS"]
"#,
    );
    let resolver = YamlCredentialResolver::load(f.path()).unwrap();
    let cfg = resolver.get("t1").await.unwrap();
    assert_eq!(cfg.endpoint, "https://example.atlassian.net");
    assert!(cfg.validate().is_ok());
  }

  #[tokio::test]
  async fn missing_tenant_is_missing_credentials() {
    let f = write_temp_yaml("tenants: {}\n");
    let resolver = YamlCredentialResolver::load(f.path()).unwrap();
    let err = resolver.get("ghost").await.unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredentials { .. }));
  }

  #[test]
  fn validate_rejects_empty_projects_and_jql() {
    let cfg = TenantConfig {
      tenant_id: "t1".into(),
      endpoint: "https://x".into(),
      token: "tok".into(),
      projects: BTreeSet::new(),
      labels: BTreeMap::new(),
      jql: None,
      request_timeout: Duration::from_secs(30),
    };
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn is_configured_requires_both_endpoint_and_token() {
    let mut cfg = TenantConfig {
      tenant_id: "t1".into(),
      endpoint: String::new(),
      token: "tok".into(),
      projects: BTreeSet::new(),
      labels: BTreeMap::new(),
      jql: Some("project = X".into()),
      request_timeout: Duration::from_secs(30),
    };
    assert!(!cfg.is_configured());
    cfg.endpoint = "https://x".into();
    assert!(cfg.is_configured());
  }

  #[tokio::test]
  async fn sqlite_resolver_roundtrips_a_tenant() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("credentials.db");
    let resolver = SqliteCredentialResolver::open(&db_path).unwrap();

    let mut projects = BTreeSet::new();
    projects.insert("BTVO".to_string());
    let mut labels = BTreeMap::new();
    labels.insert("BTVO".to_string(), BTreeSet::from(["NCMS".to_string()]));

    let cfg = TenantConfig {
      tenant_id: "t1".into(),
      endpoint: "https://example.atlassian.net".into(),
      token: "secret".into(),
      projects,
      labels,
      jql: None,
      request_timeout: Duration::from_secs(45),
    };
    resolver.upsert_tenant(&cfg).unwrap();

    let round_tripped = resolver.get("t1").await.unwrap();
    assert_eq!(round_tripped.endpoint, cfg.endpoint);
    assert_eq!(round_tripped.request_timeout, Duration::from_secs(45));
    assert_eq!(resolver.all_tenant_ids().await.unwrap(), vec!["t1"]);
  }

  #[tokio::test]
  async fn sqlite_resolver_missing_tenant_errors() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = SqliteCredentialResolver::open(&dir.path().join("credentials.db")).unwrap();
    let err = resolver.get("ghost").await.unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredentials { .. }));
  }
}
