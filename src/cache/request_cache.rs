//! Per-tenant, month-scoped memoization of `JiraGateway` calls.
//!
//! Wraps the gateway transparently: the same `search_issues`/`get_issue`
//! signatures, with a cache check in front. Entries live for the current
//! calendar month and are dropped en masse on the first call after
//! rollover — no background sweeper.

use crate::error::GatewayError;
use crate::jira::gateway::JiraGateway;
use crate::jira::types::{RawIssue, RawLinkedIssue};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum CacheEntry {
  List(Vec<RawIssue>),
  Single(RawIssue),
}

/// Read-only snapshot of a cache's counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
  pub total_requests: u64,
  pub hits: u64,
  pub misses: u64,
  pub api_calls: u64,
  pub cached_items: u64,
  pub current_month: String,
}

impl CacheStats {
  pub fn hit_rate(&self) -> f64 {
    if self.total_requests == 0 {
      0.0
    } else {
      self.hits as f64 / self.total_requests as f64
    }
  }
}

struct Inner {
  current_month: String,
  entries: HashMap<String, CacheEntry>,
  stats: CacheStats,
}

/// Caches one tenant's gateway calls for the current month.
pub struct RequestCache {
  gateway: JiraGateway,
  now: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
  inner: Mutex<Inner>,
}

impl RequestCache {
  pub fn new(gateway: JiraGateway) -> Self {
    Self::with_clock(gateway, Utc::now)
  }

  /// Test seam: inject a clock instead of wall-clock `Utc::now`, so the
  /// month-rollover invalidation can be driven deterministically.
  pub fn with_clock(gateway: JiraGateway, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
    let now: Box<dyn Fn() -> DateTime<Utc> + Send + Sync> = Box::new(now);
    let current_month = year_month(now());
    Self {
      gateway,
      now,
      inner: Mutex::new(Inner {
        current_month,
        entries: HashMap::new(),
        stats: CacheStats::default(),
      }),
    }
  }

  /// Compares the cache's recorded month against `self.now()` and, if
  /// they differ, clears every entry and resets counters. Called before
  /// every lookup so rollover is driven purely by traffic.
  fn check_month_rollover(&self, inner: &mut Inner) {
    let now = year_month((self.now)());
    if now != inner.current_month {
      inner.entries.clear();
      inner.stats = CacheStats::default();
      inner.current_month = now;
    }
  }

  pub async fn search_issues(
    &self,
    jql: &str,
    page_size: u64,
    fields: &[&str],
  ) -> Result<Vec<RawIssue>, GatewayError> {
    let key = {
      let mut inner = self.inner.lock().expect("lock poisoned");
      self.check_month_rollover(&mut inner);
      inner.stats.total_requests += 1;
      let key = jql_cache_key(&inner.current_month, jql, page_size, fields);

      if let Some(CacheEntry::List(issues)) = inner.entries.get(&key) {
        inner.stats.hits += 1;
        return Ok(issues.clone());
      }
      inner.stats.misses += 1;
      key
    };

    let issues = {
      let mut inner = self.inner.lock().expect("lock poisoned");
      inner.stats.api_calls += 1;
      drop(inner);
      self.gateway.search_issues(jql, page_size, fields).await?
    };

    let mut inner = self.inner.lock().expect("lock poisoned");
    inner.entries.insert(key, CacheEntry::List(issues.clone()));
    inner.stats.cached_items = inner.entries.len() as u64;
    Ok(issues)
  }

  pub async fn get_issue(
    &self,
    issue_key: &str,
    expand: Option<&str>,
  ) -> Result<Option<RawIssue>, GatewayError> {
    let key = {
      let mut inner = self.inner.lock().expect("lock poisoned");
      self.check_month_rollover(&mut inner);
      inner.stats.total_requests += 1;
      let key = issue_cache_key(&inner.current_month, issue_key, expand);

      if let Some(CacheEntry::Single(issue)) = inner.entries.get(&key) {
        inner.stats.hits += 1;
        return Ok(Some(issue.clone()));
      }
      inner.stats.misses += 1;
      key
    };

    let fetched = {
      let mut inner = self.inner.lock().expect("lock poisoned");
      inner.stats.api_calls += 1;
      drop(inner);
      self.gateway.get_issue(issue_key, expand).await?
    };

    if let Some(issue) = &fetched {
      let mut inner = self.inner.lock().expect("lock poisoned");
      inner.entries.insert(key, CacheEntry::Single(issue.clone()));
      inner.stats.cached_items = inner.entries.len() as u64;
    }
    Ok(fetched)
  }

  /// Passthrough connectivity check; not cached, always hits the network.
  pub async fn test_connection(&self) -> bool {
    self.gateway.test_connection().await
  }

  /// Passthrough to the gateway's link lookup. Link graphs are not
  /// memoized — they are cheap, single-issue calls and staleness there
  /// matters more than for bulk search results.
  pub async fn gateway_issue_links(
    &self,
    issue_key: &str,
    link_type: Option<&str>,
  ) -> Result<Vec<RawLinkedIssue>, GatewayError> {
    self.gateway.get_issue_links(issue_key, link_type).await
  }

  /// Distinct issues seen in any list-valued entry, deduplicated by key.
  /// First-seen wins; insertion order is not guaranteed.
  pub fn get_all_cached_issues(&self) -> Vec<RawIssue> {
    let inner = self.inner.lock().expect("lock poisoned");
    let mut seen = HashMap::new();
    for entry in inner.entries.values() {
      if let CacheEntry::List(issues) = entry {
        for issue in issues {
          seen.entry(issue.key.clone()).or_insert_with(|| issue.clone());
        }
      }
    }
    seen.into_values().collect()
  }

  pub fn stats(&self) -> CacheStats {
    let inner = self.inner.lock().expect("lock poisoned");
    CacheStats {
      current_month: inner.current_month.clone(),
      ..inner.stats.clone()
    }
  }

  pub fn current_month(&self) -> String {
    let inner = self.inner.lock().expect("lock poisoned");
    inner.current_month.clone()
  }

  pub fn clear(&self) {
    let mut inner = self.inner.lock().expect("lock poisoned");
    inner.entries.clear();
    inner.stats = CacheStats::default();
  }
}

fn year_month(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m").to_string()
}

fn jql_cache_key(month: &str, jql: &str, page_size: u64, fields: &[&str]) -> String {
  let mut sorted_fields: Vec<&str> = fields.to_vec();
  sorted_fields.sort_unstable();
  let content = format!("{jql}|{page_size}|{}", sorted_fields.join(","));
  let digest = Sha256::digest(content.as_bytes());
  let short_hash = hex::encode(&digest[..4]);
  format!("{month}_jql_{short_hash}")
}

fn issue_cache_key(month: &str, issue_key: &str, expand: Option<&str>) -> String {
  match expand {
    Some(expand) => format!("{month}_{issue_key}_expand_{expand}"),
    None => format!("{month}_{issue_key}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  fn gateway() -> JiraGateway {
    JiraGateway::new("https://x.atlassian.net", "tok", Duration::from_secs(30)).unwrap()
  }

  #[test]
  fn jql_cache_key_is_stable_regardless_of_field_order() {
    let a = jql_cache_key("2025-01", "project = X", 100, &["b", "a"]);
    let b = jql_cache_key("2025-01", "project = X", 100, &["a", "b"]);
    assert_eq!(a, b);
  }

  #[test]
  fn issue_cache_key_includes_expand_only_when_present() {
    assert_eq!(issue_cache_key("2025-01", "BTVO-1", None), "2025-01_BTVO-1");
    assert_eq!(
      issue_cache_key("2025-01", "BTVO-1", Some("changelog")),
      "2025-01_BTVO-1_expand_changelog"
    );
  }

  #[test]
  fn new_cache_starts_with_zeroed_stats() {
    let cache = RequestCache::new(gateway());
    let stats = cache.stats();
    assert_eq!(stats.total_requests, 0);
    assert_eq!(stats.hit_rate(), 0.0);
  }

  #[tokio::test]
  async fn month_rollover_clears_entries_and_advances_current_month() {
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex as StdMutex};

    let clock = Arc::new(StdMutex::new(Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()));
    let clock_for_cache = clock.clone();
    // Port 1 refuses connections immediately, so the lookup fails fast
    // instead of waiting on a timeout; only the rollover bookkeeping
    // around the call is under test here.
    let gw = JiraGateway::new("http://127.0.0.1:1", "tok", Duration::from_secs(1)).unwrap();
    let cache = RequestCache::with_clock(gw, move || *clock_for_cache.lock().expect("lock poisoned"));

    assert_eq!(cache.current_month(), "2025-01");
    let _ = cache.search_issues("project = X", 50, &[]).await;
    assert_eq!(cache.stats().total_requests, 1);

    *clock.lock().expect("lock poisoned") = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

    let _ = cache.search_issues("project = X", 50, &[]).await;
    let stats = cache.stats();
    assert_eq!(stats.current_month, "2025-02");
    assert_eq!(stats.total_requests, 1);
  }

  #[test]
  fn clear_resets_entries_and_stats() {
    let cache = RequestCache::new(gateway());
    cache.clear();
    assert_eq!(cache.get_all_cached_issues().len(), 0);
  }
}
