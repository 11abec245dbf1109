//! Builds time-bounded JQL from tenant configuration plus the last-success
//! watermark. Pure and network-free: the coordinator passes the resulting
//! string straight to the (cached) gateway.

use crate::config::TenantConfig;
use crate::watermark::Watermark;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Deep-history floor used when a tenant has never synced successfully.
pub const DEFAULT_HISTORY_DAYS: i64 = 3650;

/// Floor used when the caller requests a forced full sync instead of deep
/// history — smaller, but still wide enough to pick up a large tenant's
/// recent backlog without re-walking a decade of issues.
pub const FORCE_FULL_SYNC_DAYS: i64 = 7;

pub struct QueryPlanner;

impl QueryPlanner {
  /// Produces the JQL string for one sync attempt.
  pub fn plan(config: &TenantConfig, watermark: Option<&Watermark>, force_full_sync: bool) -> String {
    let base = match &config.jql {
      Some(jql) if !jql.is_empty() => jql.clone(),
      _ => Self::build_project_clause(config),
    };

    let floor_date = Self::time_floor(watermark, force_full_sync);
    let with_floor = if base.is_empty() {
      format!("updated >= '{floor_date}'")
    } else {
      format!("({base}) AND updated >= '{floor_date}'")
    };

    format!("{with_floor} ORDER BY updated DESC")
  }

  fn build_project_clause(config: &TenantConfig) -> String {
    config
      .projects
      .iter()
      .map(|project| match config.labels.get(project) {
        Some(labels) if !labels.is_empty() => {
          let quoted: Vec<String> = labels.iter().map(|l| format!("\"{l}\"")).collect();
          format!("(project = \"{project}\" AND labels IN ({}))", quoted.join(", "))
        }
        _ => format!("project = \"{project}\""),
      })
      .collect::<Vec<_>>()
      .join(" OR ")
  }

  /// Jira JQL only accepts date (not datetime) resolution at day
  /// granularity; this yields a deliberate one-day overlap on retries,
  /// which is safe because chunk ids are deterministic and upsert is
  /// idempotent by id.
  fn time_floor(watermark: Option<&Watermark>, force_full_sync: bool) -> String {
    let now = Utc::now();
    let floor: DateTime<Utc> = if force_full_sync {
      now - ChronoDuration::days(FORCE_FULL_SYNC_DAYS)
    } else {
      match watermark {
        Some(w) => w.last_run_at,
        None => now - ChronoDuration::days(DEFAULT_HISTORY_DAYS),
      }
    };
    floor.format("%Y-%m-%d").to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::watermark::{BatchStatus, Watermark};
  use std::collections::{BTreeMap, BTreeSet};
  use std::time::Duration;

  fn config_with(projects: &[&str], labels: &[(&str, &[&str])], jql: Option<&str>) -> TenantConfig {
    let mut label_map = BTreeMap::new();
    for (project, ls) in labels {
      label_map.insert(project.to_string(), ls.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>());
    }
    TenantConfig {
      tenant_id: "t1".into(),
      endpoint: "https://x.atlassian.net".into(),
      token: "tok".into(),
      projects: projects.iter().map(|s| s.to_string()).collect(),
      labels: label_map,
      jql: jql.map(String::from),
      request_timeout: Duration::from_secs(30),
    }
  }

  #[test]
  fn raw_jql_override_used_verbatim() {
    let config = config_with(&[], &[], Some("project = BTVO"));
    let jql = QueryPlanner::plan(&config, None, false);
    assert!(jql.starts_with("(project = BTVO) AND updated >="));
    assert!(jql.ends_with("ORDER BY updated DESC"));
  }

  #[test]
  fn project_without_labels_emits_bare_clause() {
    let config = config_with(&["BTVO"], &[], None);
    let jql = QueryPlanner::plan(&config, None, false);
    assert!(jql.contains("project = \"BTVO\""));
    assert!(!jql.contains("labels IN"));
  }

  #[test]
  fn project_with_labels_emits_label_clause() {
    let config = config_with(&["BTVO"], &[("BTVO", &["NCMS"])], None);
    let jql = QueryPlanner::plan(&config, None, false);
    assert!(jql.contains("project = \"BTVO\" AND labels IN (\"NCMS\")"));
  }

  #[test]
  fn multiple_projects_joined_with_or() {
    let config = config_with(&["A", "B"], &[], None);
    let jql = QueryPlanner::plan(&config, None, false);
    assert!(jql.contains(" OR "));
  }

  #[test]
  fn missing_watermark_uses_deep_history() {
    let config = config_with(&["A"], &[], None);
    let jql = QueryPlanner::plan(&config, None, false);
    let expected_floor = (Utc::now() - ChronoDuration::days(DEFAULT_HISTORY_DAYS))
      .format("%Y-%m-%d")
      .to_string();
    assert!(jql.contains(&expected_floor));
  }

  #[test]
  fn force_full_sync_overrides_to_seven_days() {
    let config = config_with(&["A"], &[], None);
    let jql = QueryPlanner::plan(&config, None, true);
    let expected_floor = (Utc::now() - ChronoDuration::days(FORCE_FULL_SYNC_DAYS))
      .format("%Y-%m-%d")
      .to_string();
    assert!(jql.contains(&expected_floor));
  }

  #[test]
  fn watermark_present_uses_its_last_run_at_as_floor() {
    let config = config_with(&["A"], &[], None);
    let watermark = Watermark {
      tenant_id: "t1".into(),
      batch_kind: "jira_sync".into(),
      last_run_at: Utc::now() - ChronoDuration::days(2),
      status: BatchStatus::Success,
      processed_count: 10,
      error_message: None,
      created_at: Utc::now(),
    };
    let jql = QueryPlanner::plan(&config, Some(&watermark), false);
    let expected_floor = watermark.last_run_at.format("%Y-%m-%d").to_string();
    assert!(jql.contains(&expected_floor));
  }
}
