//! Process-wide `tenant_id -> RequestCache` lookup table.
//!
//! The registry owns no credentials; it only keeps a handle to each
//! tenant's cache so that sync and agent call sites share one cache
//! instance per tenant, and so aggregate stats/invalidation can be
//! computed across all of them.

use crate::cache::request_cache::{CacheStats, RequestCache};
use crate::jira::gateway::JiraGateway;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Cross-tenant aggregate view, a superset of the per-tenant `CacheStats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalCacheStats {
  pub total_requests: u64,
  pub hits: u64,
  pub misses: u64,
  pub api_calls: u64,
  pub cached_items: u64,
  pub registered_tenants: usize,
}

impl TotalCacheStats {
  pub fn hit_rate(&self) -> f64 {
    if self.total_requests == 0 {
      0.0
    } else {
      self.hits as f64 / self.total_requests as f64
    }
  }
}

pub struct CacheRegistry {
  caches: RwLock<HashMap<String, Arc<RequestCache>>>,
}

impl CacheRegistry {
  pub fn new() -> Self {
    Self {
      caches: RwLock::new(HashMap::new()),
    }
  }

  /// Returns the tenant's cache, creating and registering one from
  /// `make_gateway` on first access.
  pub fn get_or_create(
    &self,
    tenant_id: &str,
    make_gateway: impl FnOnce() -> JiraGateway,
  ) -> Arc<RequestCache> {
    if let Some(cache) = self.caches.read().expect("lock poisoned").get(tenant_id) {
      return cache.clone();
    }
    let mut caches = self.caches.write().expect("lock poisoned");
    caches
      .entry(tenant_id.to_string())
      .or_insert_with(|| Arc::new(RequestCache::new(make_gateway())))
      .clone()
  }

  pub fn get(&self, tenant_id: &str) -> Option<Arc<RequestCache>> {
    self.caches.read().expect("lock poisoned").get(tenant_id).cloned()
  }

  pub fn registered_tenants(&self) -> usize {
    self.caches.read().expect("lock poisoned").len()
  }

  pub fn total_stats(&self) -> TotalCacheStats {
    let caches = self.caches.read().expect("lock poisoned");
    let mut total = TotalCacheStats {
      registered_tenants: caches.len(),
      ..Default::default()
    };
    for cache in caches.values() {
      let CacheStats {
        total_requests,
        hits,
        misses,
        api_calls,
        cached_items,
        current_month: _,
      } = cache.stats();
      total.total_requests += total_requests;
      total.hits += hits;
      total.misses += misses;
      total.api_calls += api_calls;
      total.cached_items += cached_items;
    }
    total
  }

  pub fn clear_all(&self) {
    let caches = self.caches.read().expect("lock poisoned");
    for cache in caches.values() {
      cache.clear();
    }
  }
}

impl Default for CacheRegistry {
  fn default() -> Self {
    Self::new()
  }
}
