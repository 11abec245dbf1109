//! The external vector-store contract. The core depends only on this trait;
//! a real implementation (embeddings + ANN index) lives outside this crate.

use crate::chunker::Chunk;
use crate::error::VectorStoreError;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// A chunk returned from a similarity query, paired with its score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
  pub chunk_id: String,
  pub text: String,
  pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
  /// Upserts a batch of chunks by `chunk_id`. Implementations should treat
  /// a single bad chunk as recoverable (caller decides whether to retry);
  /// only a whole-batch failure (store unreachable) should return `Err`.
  async fn upsert(&self, chunks: &[Chunk]) -> Result<usize, VectorStoreError>;

  async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, VectorStoreError>;
}

/// An in-process, no-op store: upserts are accepted and recorded in memory,
/// queries return nothing ranked. Safe default when no real store is
/// configured, and used directly in tests that don't care about retrieval.
pub struct NoopVectorStore {
  upserted: Mutex<Vec<Chunk>>,
}

impl NoopVectorStore {
  pub fn new() -> Self {
    Self {
      upserted: Mutex::new(Vec::new()),
    }
  }

  /// Test/debug helper: returns how many chunks have been upserted so far.
  pub fn upserted_count(&self) -> usize {
    self.upserted.lock().expect("lock poisoned").len()
  }
}

impl Default for NoopVectorStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl VectorStore for NoopVectorStore {
  #[instrument(skip(self, chunks))]
  async fn upsert(&self, chunks: &[Chunk]) -> Result<usize, VectorStoreError> {
    debug!(count = chunks.len(), "no-op vector store upsert");
    let mut guard = self.upserted.lock().expect("lock poisoned");
    guard.extend_from_slice(chunks);
    Ok(chunks.len())
  }

  async fn query(&self, _text: &str, _k: usize) -> Result<Vec<ScoredChunk>, VectorStoreError> {
    Ok(Vec::new())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chunker::ChunkKind;
  use std::collections::BTreeMap;

  fn sample_chunk(id: &str) -> Chunk {
    Chunk {
      chunk_id: id.to_string(),
      kind: ChunkKind::Summary,
      index: 0,
      text: "hello".to_string(),
      metadata: BTreeMap::new(),
      created_at: "2025-01-01T00:00:00Z".to_string(),
      updated_at: "2025-01-01T00:00:00Z".to_string(),
    }
  }

  #[tokio::test]
  async fn noop_store_accepts_upserts_and_counts_them() {
    let store = NoopVectorStore::new();
    let chunks = vec![sample_chunk("a"), sample_chunk("b")];
    let written = store.upsert(&chunks).await.unwrap();
    assert_eq!(written, 2);
    assert_eq!(store.upserted_count(), 2);
  }

  #[tokio::test]
  async fn noop_store_query_returns_empty() {
    let store = NoopVectorStore::new();
    let results = store.query("anything", 5).await.unwrap();
    assert!(results.is_empty());
  }
}
