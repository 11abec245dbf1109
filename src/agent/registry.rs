//! Dispatches model tool calls to the built-in Jira/cache/text/format
//! catalog. Holds a handle to the tenant's request cache so `search_issues`
//! and friends can use it transparently; everything else is pure.

use super::atomic_tools as tools;
use super::tool::{ToolCall, ToolResult};
use crate::cache::RequestCache;
use crate::jira::types::issue_to_value;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct ToolRegistry {
  cache: Arc<RequestCache>,
}

impl ToolRegistry {
  pub fn new(cache: Arc<RequestCache>) -> Self {
    Self { cache }
  }

  /// Executes one tool call, returning a result message never an `Err` —
  /// failures (bad arguments, unknown tool, upstream error) are reported
  /// as an error-flagged `ToolResult` so the model can see and react to
  /// them within the conversation.
  pub async fn execute(&self, call: &ToolCall) -> ToolResult {
    let outcome = match call.name.as_str() {
      "search_issues" => self.tool_search_issues(&call.arguments).await,
      "get_linked_issues" => self.tool_get_linked_issues(&call.arguments).await,
      "get_cached_issues" => self.tool_get_cached_issues(),
      "get_cache_summary" => self.tool_get_cache_summary(),
      "group_by_system" => self.tool_group_by_system(&call.arguments),
      "get_system_summary" => self.tool_get_system_summary(&call.arguments),
      "extract_version" => self.tool_extract_version(&call.arguments),
      "extract_pattern" => self.tool_extract_pattern(&call.arguments),
      "extract_all_patterns" => self.tool_extract_all_patterns(&call.arguments),
      "find_issue_by_field" => self.tool_find_issue_by_field(&call.arguments),
      "find_all_issues_by_field" => self.tool_find_all_issues_by_field(&call.arguments),
      "group_by_field" => self.tool_group_by_field(&call.arguments),
      "filter_issues" => self.tool_filter_issues(&call.arguments),
      "count_by_field" => self.tool_count_by_field(&call.arguments),
      "sort_issues" => self.tool_sort_issues(&call.arguments),
      "extract_field_values" => self.tool_extract_field_values(&call.arguments),
      "format_as_table" => self.tool_format_as_table(&call.arguments),
      "format_as_list" => self.tool_format_as_list(&call.arguments),
      "format_date" => self.tool_format_date(&call.arguments),
      "clean_whitespace" => self.tool_clean_whitespace(&call.arguments),
      "truncate_text" => self.tool_truncate_text(&call.arguments),
      "format_as_json" => self.tool_format_as_json(&call.arguments),
      "format_as_csv" => self.tool_format_as_csv(&call.arguments),
      "format_as_summary" => self.tool_format_as_summary(&call.arguments),
      "format_key_value" => self.tool_format_key_value(&call.arguments),
      "wrap_text" => self.tool_wrap_text(&call.arguments),
      other => Err(format!("unknown tool: {other}")),
    };

    match outcome {
      Ok(content) => ToolResult::ok(&call.id, &call.name, content),
      Err(message) => ToolResult::error(&call.id, &call.name, message),
    }
  }

  async fn tool_search_issues(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      jql: String,
      #[serde(default = "default_max_results")]
      max_results: u64,
    }
    let args: Args = parse_args(args)?;
    let issues = self
      .cache
      .search_issues(&args.jql, args.max_results, &[])
      .await
      .map_err(|e| e.to_string())?;
    let values: Vec<Value> = issues.iter().map(issue_to_value).collect();
    Ok(tools::format_as_json(&Value::Array(values)))
  }

  async fn tool_get_linked_issues(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issue_key: String,
      link_type: Option<String>,
    }
    let args: Args = parse_args(args)?;
    let links = self
      .cache
      .gateway_issue_links(&args.issue_key, args.link_type.as_deref())
      .await
      .map_err(|e| e.to_string())?;
    let values: Vec<Value> = links
      .iter()
      .map(|link| {
        serde_json::json!({
          "key": link.key,
          "summary": link.summary,
          "status": link.status,
          "link_type": link.link_type,
          "link_direction": link.link_direction.as_str(),
        })
      })
      .collect();
    Ok(tools::format_as_json(&Value::Array(values)))
  }

  fn tool_get_cached_issues(&self) -> Result<String, String> {
    let issues = self.cache.get_all_cached_issues();
    let values: Vec<Value> = issues.iter().map(issue_to_value).collect();
    Ok(tools::format_as_json(&Value::Array(values)))
  }

  fn tool_get_cache_summary(&self) -> Result<String, String> {
    let stats = self.cache.stats();
    Ok(tools::format_as_json(&serde_json::json!({
      "total_requests": stats.total_requests,
      "hits": stats.hits,
      "misses": stats.misses,
      "api_calls": stats.api_calls,
      "cached_items": stats.cached_items,
      "current_month": stats.current_month,
      "hit_rate": stats.hit_rate(),
    })))
  }

  fn tool_group_by_system(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
    }
    let args: Args = parse_args(args)?;
    let groups = tools::group_by_system(&args.issues);
    let rendered: Map<String, Value> = groups
      .into_iter()
      .map(|(system, issues)| (system, Value::Array(issues.into_iter().cloned().collect())))
      .collect();
    Ok(tools::format_as_json(&Value::Object(rendered)))
  }

  fn tool_get_system_summary(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
    }
    let args: Args = parse_args(args)?;
    let summary = tools::get_system_summary(&args.issues);
    let systems: Map<String, Value> = summary
      .systems
      .into_iter()
      .map(|(name, stats)| {
        (
          name,
          serde_json::json!({
            "count": stats.count,
            "completed": stats.completed,
            "completion_rate": stats.completion_rate,
            "statuses": stats.statuses,
          }),
        )
      })
      .collect();
    Ok(tools::format_as_json(&serde_json::json!({
      "systems": systems,
      "largest_system": summary.largest_system,
      "smallest_system": summary.smallest_system,
    })))
  }

  fn tool_extract_version(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      text: String,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::extract_version(&args.text).unwrap_or_default())
  }

  fn tool_extract_pattern(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      text: String,
      pattern: String,
      #[serde(default)]
      group: usize,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::extract_pattern(&args.text, &args.pattern, args.group).unwrap_or_default())
  }

  fn tool_extract_all_patterns(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      text: String,
      pattern: String,
    }
    let args: Args = parse_args(args)?;
    let matches = tools::extract_all_patterns(&args.text, &args.pattern);
    Ok(tools::format_as_json(&Value::Array(matches.into_iter().map(Value::String).collect())))
  }

  fn tool_find_issue_by_field(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      field_name: String,
      field_value: Value,
      #[serde(default = "default_true")]
      exact_match: bool,
    }
    let args: Args = parse_args(args)?;
    let found = tools::find_issue_by_field(&args.issues, &args.field_name, &args.field_value, args.exact_match);
    Ok(tools::format_as_json(&found.cloned().unwrap_or(Value::Null)))
  }

  fn tool_find_all_issues_by_field(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      field_name: String,
      field_value: Value,
      #[serde(default = "default_true")]
      exact_match: bool,
    }
    let args: Args = parse_args(args)?;
    let found = tools::find_all_issues_by_field(&args.issues, &args.field_name, &args.field_value, args.exact_match);
    Ok(tools::format_as_json(&Value::Array(found.into_iter().cloned().collect())))
  }

  fn tool_group_by_field(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      field_name: String,
    }
    let args: Args = parse_args(args)?;
    let groups = tools::group_by_field(&args.issues, &args.field_name);
    let rendered: Map<String, Value> = groups
      .into_iter()
      .map(|(k, v)| (k, Value::Array(v.into_iter().cloned().collect())))
      .collect();
    Ok(tools::format_as_json(&Value::Object(rendered)))
  }

  fn tool_filter_issues(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      conditions: Map<String, Value>,
    }
    let args: Args = parse_args(args)?;
    let filtered = tools::filter_issues(&args.issues, &args.conditions);
    Ok(tools::format_as_json(&Value::Array(filtered.into_iter().cloned().collect())))
  }

  fn tool_count_by_field(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      field_name: String,
    }
    let args: Args = parse_args(args)?;
    let counts = tools::count_by_field(&args.issues, &args.field_name);
    Ok(tools::format_as_json(&serde_json::to_value(counts).unwrap_or(Value::Null)))
  }

  fn tool_sort_issues(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      field_name: String,
      #[serde(default)]
      descending: bool,
    }
    let args: Args = parse_args(args)?;
    let sorted = tools::sort_issues(&args.issues, &args.field_name, args.descending);
    Ok(tools::format_as_json(&Value::Array(sorted)))
  }

  fn tool_extract_field_values(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      issues: Vec<Value>,
      field_name: String,
      #[serde(default = "default_true")]
      dedupe: bool,
    }
    let args: Args = parse_args(args)?;
    let values = tools::extract_field_values(&args.issues, &args.field_name, args.dedupe);
    Ok(tools::format_as_json(&Value::Array(values)))
  }

  fn tool_format_as_table(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      data: Vec<Value>,
      columns: Vec<String>,
      #[serde(default = "default_max_width")]
      max_width: usize,
    }
    let args: Args = parse_args(args)?;
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    Ok(tools::format_as_table(&args.data, &columns, args.max_width))
  }

  fn tool_format_as_list(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      data: Vec<Value>,
      #[serde(default = "default_list_template")]
      template: String,
      #[serde(default = "default_bullet")]
      bullet: String,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::format_as_list(&args.data, &args.template, &args.bullet))
  }

  fn tool_format_date(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      date_str: String,
      #[serde(default = "default_date_format")]
      output_format: String,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::format_date(&args.date_str, &args.output_format))
  }

  fn tool_clean_whitespace(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      text: String,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::clean_whitespace(&args.text))
  }

  fn tool_truncate_text(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      text: String,
      max_len: usize,
      #[serde(default = "default_suffix")]
      suffix: String,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::truncate_text(&args.text, args.max_len, &args.suffix))
  }

  fn tool_format_as_json(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      data: Value,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::format_as_json(&args.data))
  }

  fn tool_format_as_csv(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      data: Vec<Value>,
      columns: Vec<String>,
    }
    let args: Args = parse_args(args)?;
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    Ok(tools::format_as_csv(&args.data, &columns))
  }

  fn tool_format_as_summary(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      data: Vec<Value>,
      group_by: Option<String>,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::format_as_summary(&args.data, args.group_by.as_deref()))
  }

  fn tool_format_key_value(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      data: Map<String, Value>,
      #[serde(default)]
      indent: usize,
      #[serde(default = "default_kv_separator")]
      separator: String,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::format_key_value(&args.data, args.indent, &args.separator))
  }

  fn tool_wrap_text(&self, args: &str) -> Result<String, String> {
    #[derive(Deserialize)]
    struct Args {
      text: String,
      #[serde(default = "default_wrap_width")]
      width: usize,
      #[serde(default)]
      indent: usize,
    }
    let args: Args = parse_args(args)?;
    Ok(tools::wrap_text(&args.text, args.width, args.indent))
  }
}

fn parse_args<'a, T: Deserialize<'a>>(args: &'a str) -> Result<T, String> {
  serde_json::from_str(args).map_err(|e| format!("invalid arguments: {e}"))
}

fn default_true() -> bool {
  true
}
fn default_max_results() -> u64 {
  50
}
fn default_max_width() -> usize {
  40
}
fn default_list_template() -> String {
  "{key}: {summary}".to_string()
}
fn default_bullet() -> String {
  "- ".to_string()
}
fn default_date_format() -> String {
  "%Y-%m-%d".to_string()
}
fn default_suffix() -> String {
  "...".to_string()
}
fn default_kv_separator() -> String {
  ": ".to_string()
}
fn default_wrap_width() -> usize {
  80
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jira::gateway::JiraGateway;
  use std::time::Duration;

  fn registry() -> ToolRegistry {
    let gateway = JiraGateway::new("https://x.atlassian.net", "tok", Duration::from_secs(30)).unwrap();
    ToolRegistry::new(Arc::new(RequestCache::new(gateway)))
  }

  fn call(name: &str, args: Value) -> ToolCall {
    ToolCall {
      id: "call1".to_string(),
      name: name.to_string(),
      arguments: args.to_string(),
    }
  }

  #[tokio::test]
  async fn unknown_tool_yields_error_result() {
    let registry = registry();
    let result = registry.execute(&call("does_not_exist", serde_json::json!({}))).await;
    assert!(result.is_error);
  }

  #[tokio::test]
  async fn extract_version_tool_returns_version_string() {
    let registry = registry();
    let result = registry
      .execute(&call("extract_version", serde_json::json!({"text": "release v2.3.1"})))
      .await;
    assert!(!result.is_error);
    assert_eq!(result.content, "2.3.1");
  }

  #[tokio::test]
  async fn group_by_field_tool_roundtrips_through_json() {
    let registry = registry();
    let issues = serde_json::json!([{"key": "A", "status": "Done"}, {"key": "B", "status": "Done"}]);
    let result = registry
      .execute(&call("group_by_field", serde_json::json!({"issues": issues, "field_name": "status"})))
      .await;
    assert!(!result.is_error);
    assert!(result.content.contains("\"Done\""));
  }

  #[tokio::test]
  async fn malformed_arguments_yield_error_result() {
    let registry = registry();
    let bad_call = ToolCall {
      id: "call1".to_string(),
      name: "extract_version".to_string(),
      arguments: "not json".to_string(),
    };
    let result = registry.execute(&bad_call).await;
    assert!(result.is_error);
  }

  #[tokio::test]
  async fn get_cache_summary_reports_zeroed_stats_initially() {
    let registry = registry();
    let result = registry.execute(&call("get_cache_summary", serde_json::json!({}))).await;
    assert!(!result.is_error);
    assert!(result.content.contains("\"total_requests\": 0"));
  }
}
