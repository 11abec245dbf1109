//! Thin HTTP adapter to the Jira REST API.
//!
//! Stateless besides the shared connection pool and fixed credentials.
//! Pagination, JQL normalization, and the HTTP→error-taxonomy mapping all
//! live here; retry policy does not — a gateway call fails once and lets
//! its caller (the coordinator) decide what to do next.

use crate::error::GatewayError;
use crate::jira::types::{parse_issue_links, ApiIssue, ApiSearchResponse, RawIssue, RawLinkedIssue};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Delay inserted between successive search pages, as a conservative
/// rate-limiting floor against the Jira API.
const PAGE_DELAY: Duration = Duration::from_millis(100);

/// Fields requested when the caller does not specify its own set.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &[
  "key",
  "summary",
  "description",
  "issuetype",
  "status",
  "priority",
  "labels",
  "assignee",
  "reporter",
  "project",
  "comment",
  "components",
  "fixVersions",
  "created",
  "updated",
];

pub struct JiraGateway {
  http: reqwest::Client,
  endpoint: String,
  token: String,
}

impl JiraGateway {
  pub fn new(endpoint: &str, token: &str, request_timeout: Duration) -> Result<Self, GatewayError> {
    let http = reqwest::Client::builder()
      .tcp_nodelay(true)
      .pool_max_idle_per_host(10)
      .timeout(request_timeout)
      .build()
      .map_err(|e| GatewayError::Network(e.to_string()))?;

    Ok(Self {
      http,
      endpoint: endpoint.trim_end_matches('/').to_string(),
      token: token.to_string(),
    })
  }

  fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
    self
      .http
      .request(method, format!("{}{}", self.endpoint, path))
      .bearer_auth(&self.token)
      .header("Accept", "application/json")
      .header("Content-Type", "application/json")
  }

  /// `GET /rest/api/2/myself` — connectivity test.
  #[instrument(skip(self))]
  pub async fn test_connection(&self) -> bool {
    match self
      .request(reqwest::Method::GET, "/rest/api/2/myself")
      .send()
      .await
    {
      Ok(resp) => resp.status().is_success(),
      Err(e) => {
        warn!(error = %e, "connectivity test failed");
        false
      }
    }
  }

  /// Paginated JQL search. Follows `startAt` until a page returns fewer
  /// issues than `page_size`.
  #[instrument(skip(self, fields), fields(jql = %jql))]
  pub async fn search_issues(
    &self,
    jql: &str,
    page_size: u64,
    fields: &[&str],
  ) -> Result<Vec<RawIssue>, GatewayError> {
    let jql = normalize_jql(jql);
    let fields_param = fields.join(",");
    let mut all_issues = Vec::new();
    let mut start_at = 0u64;

    loop {
      let response = self
        .request(reqwest::Method::GET, "/rest/api/2/search")
        .query(&[
          ("jql", jql.as_str()),
          ("fields", fields_param.as_str()),
          ("startAt", &start_at.to_string()),
          ("maxResults", &page_size.to_string()),
        ])
        .send()
        .await?;

      let status = response.status();
      if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::from_status(status.as_u16(), &body));
      }

      let page: ApiSearchResponse = response
        .json()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

      let page_count = page.issues.len() as u64;
      debug!(start_at, page_count, total = page.total, "fetched search page");
      all_issues.extend(page.issues.into_iter().map(RawIssue::from));

      if page_count < page_size || start_at + page_count >= page.total {
        break;
      }
      start_at += page_size;
      tokio::time::sleep(PAGE_DELAY).await;
    }

    Ok(all_issues)
  }

  /// Single-issue fetch. A 404 yields `Ok(None)`, not an error.
  #[instrument(skip(self))]
  pub async fn get_issue(
    &self,
    key: &str,
    expand: Option<&str>,
  ) -> Result<Option<RawIssue>, GatewayError> {
    let path = format!("/rest/api/2/issue/{key}");
    let mut req = self.request(reqwest::Method::GET, &path);
    if let Some(expand) = expand {
      req = req.query(&[("expand", expand)]);
    }

    let response = req.send().await?;
    let status = response.status();
    if status.as_u16() == 404 {
      return Ok(None);
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(GatewayError::from_status(status.as_u16(), &body));
    }

    let issue: ApiIssue = response
      .json()
      .await
      .map_err(|e| GatewayError::Network(e.to_string()))?;
    Ok(Some(RawIssue::from(issue)))
  }

  /// Fetches one issue's `issuelinks` and returns the linked issues,
  /// optionally filtered to a single link type name. A 404 yields an
  /// empty list, not an error.
  #[instrument(skip(self))]
  pub async fn get_issue_links(
    &self,
    key: &str,
    link_type: Option<&str>,
  ) -> Result<Vec<RawLinkedIssue>, GatewayError> {
    let path = format!("/rest/api/2/issue/{key}");
    let response = self
      .request(reqwest::Method::GET, &path)
      .query(&[("expand", "issuelinks"), ("fields", "issuelinks")])
      .send()
      .await?;

    let status = response.status();
    if status.as_u16() == 404 {
      return Ok(Vec::new());
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(GatewayError::from_status(status.as_u16(), &body));
    }

    let issue: ApiIssue = response
      .json()
      .await
      .map_err(|e| GatewayError::Network(e.to_string()))?;
    Ok(parse_issue_links(&issue.fields.extra, link_type))
  }
}

/// Normalizes JQL the way the Jira server expects it:
/// - string literals written with single quotes become double-quoted.
/// - the plural `fixVersions` field reference is rewritten to the
///   singular `fixVersion` (a Jira-specific quirk: the field is queryable
///   only under its singular name even though the response field is plural).
///
/// Idempotent: `normalize(normalize(q)) == normalize(q)`.
pub fn normalize_jql(jql: &str) -> String {
  let requoted = requote_single_quotes(jql);
  rewrite_fix_versions_field(&requoted)
}

fn requote_single_quotes(jql: &str) -> String {
  let mut out = String::with_capacity(jql.len());
  let mut chars = jql.chars().peekable();
  let mut in_double = false;
  while let Some(c) = chars.next() {
    match c {
      '"' => {
        in_double = !in_double;
        out.push(c);
      }
      '\'' if !in_double => out.push('"'),
      _ => out.push(c),
    }
  }
  out
}

fn rewrite_fix_versions_field(jql: &str) -> String {
  // Word-boundary replace: "fixVersions" used as a bare field reference
  // (not inside a quoted literal) becomes "fixVersion".
  let mut out = String::with_capacity(jql.len());
  let mut in_quotes = false;
  let mut rest = jql;
  while !rest.is_empty() {
    if let Some(idx) = rest.find(['"', '\'']) {
      let (chunk, tail) = rest.split_at(idx);
      if !in_quotes {
        out.push_str(&replace_field_word(chunk));
      } else {
        out.push_str(chunk);
      }
      let quote_char = tail.chars().next().unwrap();
      out.push(quote_char);
      in_quotes = !in_quotes;
      rest = &tail[quote_char.len_utf8()..];
    } else {
      if !in_quotes {
        out.push_str(&replace_field_word(rest));
      } else {
        out.push_str(rest);
      }
      rest = "";
    }
  }
  out
}

fn replace_field_word(segment: &str) -> String {
  segment.replace("fixVersions", "fixVersion")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn requotes_single_quoted_literals() {
    assert_eq!(
      normalize_jql("project = 'BTVO' AND status = 'Done'"),
      "project = \"BTVO\" AND status = \"Done\""
    );
  }

  #[test]
  fn rewrites_fix_versions_field_reference() {
    assert_eq!(
      normalize_jql("fixVersions = \"1.0\""),
      "fixVersion = \"1.0\""
    );
  }

  #[test]
  fn leaves_fix_versions_inside_string_literal_untouched() {
    let input = "summary ~ 'mentions fixVersions literally'";
    let out = normalize_jql(input);
    assert!(out.contains("fixVersions literally"));
  }

  #[test]
  fn normalize_is_idempotent() {
    let q = "project = 'X' AND fixVersions = '1.0' ORDER BY updated DESC";
    let once = normalize_jql(q);
    let twice = normalize_jql(&once);
    assert_eq!(once, twice);
  }

  #[test]
  fn default_fields_cover_spec_catalog() {
    assert!(DEFAULT_SEARCH_FIELDS.contains(&"key"));
    assert!(DEFAULT_SEARCH_FIELDS.contains(&"fixVersions"));
    assert_eq!(DEFAULT_SEARCH_FIELDS.len(), 15);
  }
}
