//! Multi-tenant Jira sync engine with a tool-calling LLM agent surface.
//!
//! The sync half (`BatchOrchestrator` -> `SyncCoordinator` -> `RequestCache`
//! -> `JiraGateway` -> `IssueChunker` -> vector store -> `WatermarkStore`)
//! and the agent half (`AgentLoop` -> `ToolRegistry` -> atomic tools, reading
//! through the same `RequestCache`) share the cache as their only seam.

pub mod agent;
pub mod batch;
pub mod cache;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod jira;
pub mod query_planner;
pub mod sync;
pub mod vector_store;
pub mod watermark;
