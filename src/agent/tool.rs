//! Tool-calling types and the built-in catalog of Jira-domain tools.
//!
//! Mirrors an OpenAI-style function-calling surface: a [`ToolDefinition`]
//! advertises a name, description, and JSON-Schema parameter shape; a
//! [`ToolCall`] is what the model asks to run; a [`ToolResult`] is what
//! gets fed back as a `Role::Tool` message.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One tool the model may call, in OpenAI function-calling shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
  #[serde(rename = "type")]
  pub kind: String,
  pub function: ToolFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
  pub name: String,
  pub description: String,
  pub parameters: Value,
}

impl ToolDefinition {
  pub fn new(name: &str, description: &str, parameters: Value) -> Self {
    Self {
      kind: "function".to_string(),
      function: ToolFunction {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
      },
    }
  }

  pub fn name(&self) -> &str {
    &self.function.name
  }
}

/// A model-requested invocation of one tool, with arguments as a raw JSON
/// string (as providers hand them back, before validation/parsing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
  pub id: String,
  pub name: String,
  pub arguments: String,
}

/// The outcome of executing a [`ToolCall`], ready to be wrapped into a
/// `Role::Tool` message and appended to the conversation.
#[derive(Debug, Clone)]
pub struct ToolResult {
  pub tool_call_id: String,
  pub name: String,
  pub content: String,
  pub is_error: bool,
}

impl ToolResult {
  pub fn ok(tool_call_id: &str, name: &str, content: String) -> Self {
    Self {
      tool_call_id: tool_call_id.to_string(),
      name: name.to_string(),
      content,
      is_error: false,
    }
  }

  pub fn error(tool_call_id: &str, name: &str, message: String) -> Self {
    Self {
      tool_call_id: tool_call_id.to_string(),
      name: name.to_string(),
      content: message,
      is_error: true,
    }
  }
}

/// A named bundle of [`ToolDefinition`]s handed to a provider request.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
  pub tools: Vec<ToolDefinition>,
}

impl ToolSet {
  pub fn new(tools: Vec<ToolDefinition>) -> Self {
    Self { tools }
  }

  pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
    self.tools.iter().find(|t| t.name() == name)
  }

  pub fn names(&self) -> Vec<&str> {
    self.tools.iter().map(|t| t.name()).collect()
  }

  /// The complete catalog an agent run exposes to the model: the core
  /// Jira/cache/system tools plus the general-purpose text and formatting
  /// supplements.
  pub fn jira_tools() -> Self {
    Self::new(vec![
      def_search_issues(),
      def_get_linked_issues(),
      def_get_cached_issues(),
      def_get_cache_summary(),
      def_group_by_system(),
      def_get_system_summary(),
      def_extract_version(),
      def_extract_pattern(),
      def_find_issue_by_field(),
      def_find_all_issues_by_field(),
      def_group_by_field(),
      def_filter_issues(),
      def_count_by_field(),
      def_format_as_table(),
      def_format_as_list(),
      def_sort_issues(),
      def_extract_field_values(),
      def_extract_all_patterns(),
      def_format_date(),
      def_clean_whitespace(),
      def_truncate_text(),
      def_format_as_json(),
      def_format_as_csv(),
      def_format_as_summary(),
      def_format_key_value(),
      def_wrap_text(),
    ])
  }
}

fn def_search_issues() -> ToolDefinition {
  ToolDefinition::new(
    "search_issues",
    "Searches Jira issues by JQL and returns matching issues, using the tenant's request cache.",
    json!({
      "type": "object",
      "properties": {
        "jql": {"type": "string", "description": "JQL query string."},
        "max_results": {"type": "integer", "description": "Maximum issues to return.", "default": 50}
      },
      "required": ["jql"]
    }),
  )
}

fn def_get_linked_issues() -> ToolDefinition {
  ToolDefinition::new(
    "get_linked_issues",
    "Returns the issues linked to a given issue key, grouped by link type.",
    json!({
      "type": "object",
      "properties": {
        "issue_key": {"type": "string", "description": "Key of the issue whose links to follow."}
      },
      "required": ["issue_key"]
    }),
  )
}

fn def_get_cached_issues() -> ToolDefinition {
  ToolDefinition::new(
    "get_cached_issues",
    "Returns every issue already present in this tenant's in-memory request cache, without calling the Jira API.",
    json!({"type": "object", "properties": {}}),
  )
}

fn def_get_cache_summary() -> ToolDefinition {
  ToolDefinition::new(
    "get_cache_summary",
    "Returns this tenant's cache statistics: total requests, hits, misses, API calls, hit rate, and cached item count.",
    json!({"type": "object", "properties": {}}),
  )
}

fn def_group_by_system() -> ToolDefinition {
  ToolDefinition::new(
    "group_by_system",
    "Groups a set of issues by the system name extracted from their labels or summary.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}, "description": "Issues to group."}
      },
      "required": ["issues"]
    }),
  )
}

fn def_get_system_summary() -> ToolDefinition {
  ToolDefinition::new(
    "get_system_summary",
    "Summarizes a set of issues per extracted system: issue count, completion rate, and status breakdown.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}, "description": "Issues to summarize."}
      },
      "required": ["issues"]
    }),
  )
}

fn def_extract_version() -> ToolDefinition {
  ToolDefinition::new(
    "extract_version",
    "Extracts a version number (e.g. v1.2.3, 버전 1.2, bare 1.2.3) from free text.",
    json!({
      "type": "object",
      "properties": {"text": {"type": "string"}},
      "required": ["text"]
    }),
  )
}

fn def_extract_pattern() -> ToolDefinition {
  ToolDefinition::new(
    "extract_pattern",
    "Extracts the first regex match (or a specific capture group) from text.",
    json!({
      "type": "object",
      "properties": {
        "text": {"type": "string"},
        "pattern": {"type": "string", "description": "Regular expression."},
        "group": {"type": "integer", "description": "Capture group index, 0 for the whole match.", "default": 0}
      },
      "required": ["text", "pattern"]
    }),
  )
}

fn def_find_issue_by_field() -> ToolDefinition {
  ToolDefinition::new(
    "find_issue_by_field",
    "Finds the first issue whose field matches a value. exact_match=true (default) uses trimmed case-insensitive equality; exact_match=false uses case-insensitive substring matching. These are distinct modes.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "field_name": {"type": "string"},
        "field_value": {},
        "exact_match": {"type": "boolean", "default": true}
      },
      "required": ["issues", "field_name", "field_value"]
    }),
  )
}

fn def_find_all_issues_by_field() -> ToolDefinition {
  ToolDefinition::new(
    "find_all_issues_by_field",
    "Finds every issue whose field matches a value, under the same exact/substring rule as find_issue_by_field.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "field_name": {"type": "string"},
        "field_value": {},
        "exact_match": {"type": "boolean", "default": true}
      },
      "required": ["issues", "field_name", "field_value"]
    }),
  )
}

fn def_group_by_field() -> ToolDefinition {
  ToolDefinition::new(
    "group_by_field",
    "Groups issues by a field's value. Missing or empty values fall into a single '(없음)' bucket.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "field_name": {"type": "string"}
      },
      "required": ["issues", "field_name"]
    }),
  )
}

fn def_filter_issues() -> ToolDefinition {
  ToolDefinition::new(
    "filter_issues",
    "Filters issues to those matching every field=value condition given (conjunctive, trimmed case-insensitive equality).",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "conditions": {"type": "object", "description": "Map of field name to required value."}
      },
      "required": ["issues", "conditions"]
    }),
  )
}

fn def_count_by_field() -> ToolDefinition {
  ToolDefinition::new(
    "count_by_field",
    "Counts issues per distinct value of a field, using the same '(없음)' bucket rule as group_by_field.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "field_name": {"type": "string"}
      },
      "required": ["issues", "field_name"]
    }),
  )
}

fn def_format_as_table() -> ToolDefinition {
  ToolDefinition::new(
    "format_as_table",
    "Renders a list of issues as a markdown table restricted to the given columns.",
    json!({
      "type": "object",
      "properties": {
        "data": {"type": "array", "items": {"type": "object"}},
        "columns": {"type": "array", "items": {"type": "string"}},
        "max_width": {"type": "integer", "default": 40}
      },
      "required": ["data", "columns"]
    }),
  )
}

fn def_format_as_list() -> ToolDefinition {
  ToolDefinition::new(
    "format_as_list",
    "Renders a list of issues as bullet points using a {field}-style template.",
    json!({
      "type": "object",
      "properties": {
        "data": {"type": "array", "items": {"type": "object"}},
        "template": {"type": "string", "description": "e.g. '{key}: {summary}'"},
        "bullet": {"type": "string", "default": "- "}
      },
      "required": ["data", "template"]
    }),
  )
}

fn def_sort_issues() -> ToolDefinition {
  ToolDefinition::new(
    "sort_issues",
    "Sorts issues by a field's value. Issues missing the field always sort last.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "field_name": {"type": "string"},
        "descending": {"type": "boolean", "default": false}
      },
      "required": ["issues", "field_name"]
    }),
  )
}

fn def_extract_field_values() -> ToolDefinition {
  ToolDefinition::new(
    "extract_field_values",
    "Collects one field's values across a list of issues, in order, with optional de-duplication.",
    json!({
      "type": "object",
      "properties": {
        "issues": {"type": "array", "items": {"type": "object"}},
        "field_name": {"type": "string"},
        "dedupe": {"type": "boolean", "default": true}
      },
      "required": ["issues", "field_name"]
    }),
  )
}

fn def_extract_all_patterns() -> ToolDefinition {
  ToolDefinition::new(
    "extract_all_patterns",
    "Extracts every regex match found in text, in order of occurrence.",
    json!({
      "type": "object",
      "properties": {
        "text": {"type": "string"},
        "pattern": {"type": "string"}
      },
      "required": ["text", "pattern"]
    }),
  )
}

fn def_format_date() -> ToolDefinition {
  ToolDefinition::new(
    "format_date",
    "Reformats a date string into the given output format, returning the input unchanged if it cannot be parsed.",
    json!({
      "type": "object",
      "properties": {
        "date_str": {"type": "string"},
        "output_format": {"type": "string", "default": "%Y-%m-%d"}
      },
      "required": ["date_str"]
    }),
  )
}

fn def_clean_whitespace() -> ToolDefinition {
  ToolDefinition::new(
    "clean_whitespace",
    "Collapses runs of whitespace in text to single spaces and trims the ends.",
    json!({
      "type": "object",
      "properties": {"text": {"type": "string"}},
      "required": ["text"]
    }),
  )
}

fn def_truncate_text() -> ToolDefinition {
  ToolDefinition::new(
    "truncate_text",
    "Truncates text to a maximum character length, appending a suffix only when truncation occurs.",
    json!({
      "type": "object",
      "properties": {
        "text": {"type": "string"},
        "max_len": {"type": "integer"},
        "suffix": {"type": "string", "default": "..."}
      },
      "required": ["text", "max_len"]
    }),
  )
}

fn def_format_as_json() -> ToolDefinition {
  ToolDefinition::new(
    "format_as_json",
    "Pretty-prints any tool result as JSON.",
    json!({
      "type": "object",
      "properties": {"data": {}},
      "required": ["data"]
    }),
  )
}

fn def_format_as_csv() -> ToolDefinition {
  ToolDefinition::new(
    "format_as_csv",
    "Renders a list of issues as CSV restricted to the given columns.",
    json!({
      "type": "object",
      "properties": {
        "data": {"type": "array", "items": {"type": "object"}},
        "columns": {"type": "array", "items": {"type": "string"}}
      },
      "required": ["data", "columns"]
    }),
  )
}

fn def_format_as_summary() -> ToolDefinition {
  ToolDefinition::new(
    "format_as_summary",
    "Summarizes a list of issues: total count, plus an optional grouped percentage breakdown.",
    json!({
      "type": "object",
      "properties": {
        "data": {"type": "array", "items": {"type": "object"}},
        "group_by": {"type": "string"}
      },
      "required": ["data"]
    }),
  )
}

fn def_format_key_value() -> ToolDefinition {
  ToolDefinition::new(
    "format_key_value",
    "Renders a JSON object as indented 'key: value' lines, recursing into nested objects.",
    json!({
      "type": "object",
      "properties": {
        "data": {"type": "object"},
        "indent": {"type": "integer", "default": 0},
        "separator": {"type": "string", "default": ": "}
      },
      "required": ["data"]
    }),
  )
}

fn def_wrap_text() -> ToolDefinition {
  ToolDefinition::new(
    "wrap_text",
    "Word-wraps text to a fixed column width.",
    json!({
      "type": "object",
      "properties": {
        "text": {"type": "string"},
        "width": {"type": "integer", "default": 80},
        "indent": {"type": "integer", "default": 0}
      },
      "required": ["text"]
    }),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn jira_tools_has_unique_names() {
    let set = ToolSet::jira_tools();
    let mut names = set.names();
    let before = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), before);
  }

  #[test]
  fn get_finds_definition_by_name() {
    let set = ToolSet::jira_tools();
    assert!(set.get("search_issues").is_some());
    assert!(set.get("does_not_exist").is_none());
  }

  #[test]
  fn tool_result_ok_is_not_an_error() {
    let result = ToolResult::ok("call1", "search_issues", "[]".to_string());
    assert!(!result.is_error);
  }
}
