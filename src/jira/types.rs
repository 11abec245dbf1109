//! Serde-deserializable shapes matching the Jira REST API, and the thin
//! `RawIssue` projection the rest of the core consumes.
//!
//! `RawIssue` is intentionally opaque beyond the fields the chunker and
//! query planner need; we do not model the full Jira issue schema.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiStatus {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiIssueType {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiUser {
  #[serde(rename = "displayName", default)]
  pub display_name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiPriority {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiProject {
  #[serde(default)]
  pub key: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiComponent {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiFixVersion {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiComment {
  #[serde(default)]
  pub body: Option<serde_json::Value>,
  #[serde(default)]
  pub author: Option<ApiUser>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiComments {
  #[serde(default)]
  pub comments: Vec<ApiComment>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  #[serde(default)]
  pub description: Option<serde_json::Value>,
  #[serde(default)]
  pub status: Option<ApiStatus>,
  #[serde(default)]
  pub priority: Option<ApiPriority>,
  #[serde(rename = "issuetype", default)]
  pub issue_type: Option<ApiIssueType>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub assignee: Option<ApiUser>,
  #[serde(default)]
  pub reporter: Option<ApiUser>,
  #[serde(default)]
  pub project: Option<ApiProject>,
  #[serde(default)]
  pub comment: Option<ApiComments>,
  #[serde(default)]
  pub components: Vec<ApiComponent>,
  #[serde(rename = "fixVersions", default)]
  pub fix_versions: Vec<ApiFixVersion>,
  #[serde(default)]
  pub created: String,
  #[serde(default)]
  pub updated: String,
  #[serde(flatten)]
  pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
  #[serde(rename = "startAt", default)]
  pub start_at: u64,
  #[serde(rename = "maxResults", default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: u64,
}

/// A single extracted comment, in arrival order.
#[derive(Debug, Clone)]
pub struct RawComment {
  pub body: String,
  pub author: Option<String>,
}

/// The projection of a Jira issue the rest of the core consumes. Built from
/// the raw API response; never round-tripped back to Jira.
#[derive(Debug, Clone)]
pub struct RawIssue {
  pub key: String,
  pub summary: String,
  pub description: Option<String>,
  pub comments: Vec<RawComment>,
  pub status: Option<String>,
  pub priority: Option<String>,
  pub issue_type: Option<String>,
  pub project_key: Option<String>,
  pub assignee: Option<String>,
  pub reporter: Option<String>,
  pub labels: Vec<String>,
  pub components: Vec<String>,
  pub fix_versions: Vec<String>,
  pub created: String,
  pub updated: String,
}

impl From<ApiIssue> for RawIssue {
  fn from(api: ApiIssue) -> Self {
    let f = api.fields;
    RawIssue {
      key: api.key,
      summary: f.summary,
      description: f.description.as_ref().and_then(extract_description),
      comments: f
        .comment
        .map(|c| {
          c.comments
            .into_iter()
            .map(|comment| RawComment {
              body: comment
                .body
                .as_ref()
                .and_then(extract_description)
                .unwrap_or_default(),
              author: comment.author.map(|a| a.display_name),
            })
            .collect()
        })
        .unwrap_or_default(),
      status: f.status.map(|s| s.name),
      priority: f.priority.map(|p| p.name),
      issue_type: f.issue_type.map(|t| t.name),
      project_key: f.project.map(|p| p.key),
      assignee: f.assignee.map(|u| u.display_name),
      reporter: f.reporter.map(|u| u.display_name),
      labels: f.labels,
      components: f.components.into_iter().map(|c| c.name).collect(),
      fix_versions: f.fix_versions.into_iter().map(|v| v.name).collect(),
      created: f.created,
      updated: f.updated,
    }
  }
}

/// One issue reached via an `issuelinks` entry on another issue.
#[derive(Debug, Clone)]
pub struct RawLinkedIssue {
  pub key: String,
  pub summary: String,
  pub status: Option<String>,
  pub link_type: String,
  pub link_direction: LinkDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
  Inward,
  Outward,
}

impl LinkDirection {
  pub fn as_str(self) -> &'static str {
    match self {
      LinkDirection::Inward => "inward",
      LinkDirection::Outward => "outward",
    }
  }
}

/// Parses the `issuelinks` array Jira embeds in an issue's fields (present
/// only when the issue was fetched with `expand=issuelinks` or the field
/// was requested explicitly) into [`RawLinkedIssue`]s, optionally filtered
/// to one link type name.
pub fn parse_issue_links(extra: &HashMap<String, serde_json::Value>, link_type_filter: Option<&str>) -> Vec<RawLinkedIssue> {
  let Some(links) = extra.get("issuelinks").and_then(|v| v.as_array()) else {
    return Vec::new();
  };

  let mut out = Vec::new();
  for link in links {
    let link_type = link
      .get("type")
      .and_then(|t| t.get("name"))
      .and_then(|n| n.as_str())
      .unwrap_or("Unknown")
      .to_string();

    if let Some(filter) = link_type_filter {
      if filter != link_type {
        continue;
      }
    }

    if let Some(outward) = link.get("outwardIssue") {
      if let Some(issue) = parse_linked_issue_stub(outward, &link_type, LinkDirection::Outward) {
        out.push(issue);
      }
    }
    if let Some(inward) = link.get("inwardIssue") {
      if let Some(issue) = parse_linked_issue_stub(inward, &link_type, LinkDirection::Inward) {
        out.push(issue);
      }
    }
  }
  out
}

fn parse_linked_issue_stub(
  value: &serde_json::Value,
  link_type: &str,
  direction: LinkDirection,
) -> Option<RawLinkedIssue> {
  let key = value.get("key")?.as_str()?.to_string();
  let fields = value.get("fields");
  let summary = fields
    .and_then(|f| f.get("summary"))
    .and_then(|v| v.as_str())
    .unwrap_or_default()
    .to_string();
  let status = fields
    .and_then(|f| f.get("status"))
    .and_then(|s| s.get("name"))
    .and_then(|v| v.as_str())
    .map(str::to_string);

  Some(RawLinkedIssue {
    key,
    summary,
    status,
    link_type: link_type.to_string(),
    link_direction: direction,
  })
}

/// Projects a `RawIssue` into the flat JSON object shape the declarative,
/// field-name-driven tool catalog operates on.
pub fn issue_to_value(issue: &RawIssue) -> serde_json::Value {
  serde_json::json!({
    "key": issue.key,
    "summary": issue.summary,
    "description": issue.description,
    "status": issue.status,
    "priority": issue.priority,
    "issue_type": issue.issue_type,
    "project_key": issue.project_key,
    "assignee": issue.assignee,
    "reporter": issue.reporter,
    "labels": issue.labels,
    "components": issue.components,
    "fix_versions": issue.fix_versions,
    "created": issue.created,
    "updated": issue.updated,
    "comment_count": issue.comments.len(),
  })
}

/// Extracts plain text from Jira's description/comment body, which may be
/// a plain string (API v2) or an Atlassian Document Format object (API v3).
pub fn extract_description(value: &serde_json::Value) -> Option<String> {
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
    let mut text = String::new();
    extract_adf_text(content, &mut text);
    let trimmed = text.trim();
    if !trimmed.is_empty() {
      return Some(trimmed.to_string());
    }
  }

  None
}

fn extract_adf_text(content: &[serde_json::Value], output: &mut String) {
  for node in content {
    let Some(node_type) = node.get("type").and_then(|v| v.as_str()) else {
      continue;
    };
    match node_type {
      "text" => {
        if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
          output.push_str(text);
        }
      }
      "paragraph" | "heading" | "bulletList" | "orderedList" | "listItem" => {
        if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
          extract_adf_text(children, output);
        }
        if node_type == "paragraph" || node_type == "heading" {
          output.push('\n');
        }
      }
      "hardBreak" => output.push('\n'),
      _ => {
        if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
          extract_adf_text(children, output);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extract_description_plain_string() {
    let v = serde_json::json!("plain text");
    assert_eq!(extract_description(&v), Some("plain text".to_string()));
  }

  #[test]
  fn extract_description_adf_paragraphs() {
    let v = serde_json::json!({
      "type": "doc",
      "content": [
        {"type": "paragraph", "content": [{"type": "text", "text": "first"}]},
        {"type": "paragraph", "content": [{"type": "text", "text": "second"}]},
      ]
    });
    let text = extract_description(&v).unwrap();
    assert!(text.contains("first"));
    assert!(text.contains("second"));
  }

  #[test]
  fn extract_description_empty_adf_is_none() {
    let v = serde_json::json!({"type": "doc", "content": []});
    assert_eq!(extract_description(&v), None);
  }

  fn issuelinks_extra(value: serde_json::Value) -> HashMap<String, serde_json::Value> {
    let mut extra = HashMap::new();
    extra.insert("issuelinks".to_string(), value);
    extra
  }

  #[test]
  fn parse_issue_links_extracts_outward_and_inward() {
    let extra = issuelinks_extra(serde_json::json!([
      {
        "type": {"name": "Blocks"},
        "outwardIssue": {"key": "BTVO-200", "fields": {"summary": "blocked work", "status": {"name": "신규"}}}
      },
      {
        "type": {"name": "Relates"},
        "inwardIssue": {"key": "BTVO-100", "fields": {"summary": "related work", "status": {"name": "완료"}}}
      }
    ]));
    let links = parse_issue_links(&extra, None);
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].key, "BTVO-200");
    assert_eq!(links[0].link_direction, LinkDirection::Outward);
    assert_eq!(links[1].link_type, "Relates");
  }

  #[test]
  fn parse_issue_links_filters_by_link_type() {
    let extra = issuelinks_extra(serde_json::json!([
      {"type": {"name": "Blocks"}, "outwardIssue": {"key": "A", "fields": {}}},
      {"type": {"name": "Relates"}, "outwardIssue": {"key": "B", "fields": {}}}
    ]));
    let links = parse_issue_links(&extra, Some("Relates"));
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].key, "B");
  }

  #[test]
  fn parse_issue_links_missing_field_yields_empty() {
    let extra = HashMap::new();
    assert!(parse_issue_links(&extra, None).is_empty());
  }

  #[test]
  fn issue_to_value_projects_flat_fields() {
    let issue = RawIssue {
      key: "BTVO-1".to_string(),
      summary: "Title".to_string(),
      description: None,
      comments: vec![RawComment {
        body: "hi".to_string(),
        author: None,
      }],
      status: Some("신규".to_string()),
      priority: None,
      issue_type: None,
      project_key: Some("BTVO".to_string()),
      assignee: None,
      reporter: None,
      labels: vec!["NCMS_BMT".to_string()],
      components: vec![],
      fix_versions: vec![],
      created: "2025-01-01T00:00:00.000+0900".to_string(),
      updated: "2025-01-01T00:00:00.000+0900".to_string(),
    };
    let value = issue_to_value(&issue);
    assert_eq!(value["key"], "BTVO-1");
    assert_eq!(value["labels"][0], "NCMS_BMT");
    assert_eq!(value["comment_count"], 1);
  }
}
