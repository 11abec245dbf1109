//! Per-tenant, month-scoped request cache sitting in front of `JiraGateway`,
//! plus the process-wide registry that hands out one cache per tenant.

pub mod registry;
pub mod request_cache;

pub use registry::{CacheRegistry, TotalCacheStats};
pub use request_cache::{CacheStats, RequestCache};
