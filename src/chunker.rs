//! Converts a `RawIssue` into the canonical, deterministically-id'd chunk
//! sequence the vector store indexes. Pure: no I/O, no logging side effects
//! beyond what the caller chooses to do with the result.

use crate::jira::types::RawIssue;
use std::collections::BTreeMap;

/// Segments longer than this are split at sentence boundaries.
const MAX_CHUNK_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
  Summary,
  Description,
  Comment,
}

impl ChunkKind {
  fn as_str(self) -> &'static str {
    match self {
      ChunkKind::Summary => "summary",
      ChunkKind::Description => "description",
      ChunkKind::Comment => "comment",
    }
  }
}

/// The canonical unit indexed by the vector store.
#[derive(Debug, Clone)]
pub struct Chunk {
  pub chunk_id: String,
  pub kind: ChunkKind,
  pub index: usize,
  pub text: String,
  pub metadata: BTreeMap<String, String>,
  pub created_at: String,
  pub updated_at: String,
}

pub struct IssueChunker;

impl IssueChunker {
  /// Emits chunks in `summary, description[0..N], comment[0..M]` order.
  /// `now` is an ISO-8601 timestamp supplied by the caller (the chunker
  /// itself never touches the clock, to stay pure and deterministic).
  pub fn chunk(issue: &RawIssue, endpoint: &str, now: &str) -> Vec<Chunk> {
    let metadata = Self::base_metadata(issue, endpoint);
    let mut chunks = Vec::new();

    if !issue.summary.trim().is_empty() {
      chunks.push(Chunk {
        chunk_id: format!("chunk_jira_{}_summary_0", issue.key),
        kind: ChunkKind::Summary,
        index: 0,
        text: issue.summary.clone(),
        metadata: metadata.clone(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
      });
    }

    if let Some(description) = issue.description.as_deref() {
      for (i, segment) in segment_text(description, MAX_CHUNK_LEN).into_iter().enumerate() {
        chunks.push(Chunk {
          chunk_id: format!("chunk_jira_{}_description_{}", issue.key, i),
          kind: ChunkKind::Description,
          index: i,
          text: segment,
          metadata: metadata.clone(),
          created_at: now.to_string(),
          updated_at: now.to_string(),
        });
      }
    }

    for (i, comment) in issue.comments.iter().enumerate() {
      let body = comment.body.trim();
      if body.is_empty() {
        continue;
      }
      let mut comment_metadata = metadata.clone();
      comment_metadata.insert(
        "comment_author".to_string(),
        comment.author.clone().unwrap_or_else(|| "Unknown".to_string()),
      );
      chunks.push(Chunk {
        chunk_id: format!("chunk_jira_{}_comment_{}", issue.key, i),
        kind: ChunkKind::Comment,
        index: i,
        text: body.to_string(),
        metadata: comment_metadata,
        created_at: now.to_string(),
        updated_at: now.to_string(),
      });
    }

    chunks
  }

  fn base_metadata(issue: &RawIssue, endpoint: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("issue_key".to_string(), issue.key.clone());
    metadata.insert(
      "issue_type".to_string(),
      issue.issue_type.clone().unwrap_or_else(|| "Unknown".to_string()),
    );
    metadata.insert(
      "status".to_string(),
      issue.status.clone().unwrap_or_else(|| "Unknown".to_string()),
    );
    metadata.insert(
      "priority".to_string(),
      issue.priority.clone().unwrap_or_else(|| "None".to_string()),
    );
    metadata.insert("source_url".to_string(), format!("{endpoint}/browse/{}", issue.key));
    metadata.insert(
      "labels".to_string(),
      serde_json::to_string(&issue.labels).unwrap_or_else(|_| "[]".to_string()),
    );
    if let Some(assignee) = &issue.assignee {
      metadata.insert("assignee".to_string(), assignee.clone());
    }
    if let Some(reporter) = &issue.reporter {
      metadata.insert("reporter".to_string(), reporter.clone());
    }
    metadata.insert(
      "project_key".to_string(),
      issue.project_key.clone().unwrap_or_else(|| "Unknown".to_string()),
    );
    metadata.insert("summary".to_string(), issue.summary.clone());
    metadata.insert(
      "components".to_string(),
      serde_json::to_string(&issue.components).unwrap_or_else(|_| "[]".to_string()),
    );
    metadata.insert(
      "fix_versions".to_string(),
      serde_json::to_string(&issue.fix_versions).unwrap_or_else(|_| "[]".to_string()),
    );
    metadata
  }
}

/// Splits `text` into segments of at most `max_len` characters at sentence
/// boundaries. A newline is treated as equivalent to a `". "` sentence
/// terminator. Sentences are packed greedily: the next sentence joins the
/// current segment while `current.len() + sentence.len() + 2 <= max_len`;
/// otherwise the current segment is sealed and a new one started.
fn segment_text(text: &str, max_len: usize) -> Vec<String> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Vec::new();
  }
  if trimmed.chars().count() <= max_len {
    return vec![trimmed.to_string()];
  }

  let normalized = trimmed.replace('\n', ". ");
  let mut segments = Vec::new();
  let mut current = String::new();

  for raw_sentence in normalized.split(". ") {
    let sentence = raw_sentence.trim();
    if sentence.is_empty() {
      continue;
    }
    if current.chars().count() + sentence.chars().count() + 2 <= max_len {
      current.push_str(sentence);
      current.push_str(". ");
    } else {
      if !current.is_empty() {
        segments.push(current.trim().to_string());
      }
      current = format!("{sentence}. ");
    }
  }
  if !current.is_empty() {
    segments.push(current.trim().to_string());
  }
  segments
}
