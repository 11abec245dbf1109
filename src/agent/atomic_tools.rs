//! Pure, side-effect-free operations over issue collections and text.
//!
//! Issues are represented as `serde_json::Value` objects (the same flat
//! key-value bag a dynamically-typed caller would build), so field-name
//! driven operations like `filter_issues`/`group_by_field` stay declarative
//! and schema-agnostic, matching the tool-calling surface the language
//! model actually drives.

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Default bucket label for missing/empty grouping values, kept as the
/// literal token the source system's fixtures use rather than an English
/// gloss.
pub const NONE_BUCKET: &str = "(없음)";

fn field_as_str(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Null => None,
    other => Some(other.to_string()),
  }
}

/// Trimmed, case-insensitive equality, with list fields matching if any
/// element equals the query value under the same rule.
fn matches_trimmed_ci(issue_value: &Value, query_value: &Value) -> bool {
  match (issue_value, query_value) {
    (Value::Null, Value::Null) => true,
    (Value::Null, _) | (_, Value::Null) => false,
    (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
    (Value::Array(items), Value::String(b)) => items.iter().any(|item| match item {
      Value::String(s) => s.trim().eq_ignore_ascii_case(b.trim()),
      other => other == query_value,
    }),
    (Value::Array(items), other) => items.contains(other),
    _ => issue_value == query_value,
  }
}

/// Case-insensitive substring match; only meaningful for string values.
fn matches_contains_ci(issue_value: &Value, query_value: &Value) -> bool {
  match (issue_value, query_value) {
    (Value::String(a), Value::String(b)) => a.to_lowercase().contains(&b.to_lowercase()),
    _ => issue_value == query_value,
  }
}

/// Finds the first issue whose `field_name` matches `field_value`, under
/// either the trimmed-equality rule (`exact_match = true`, the default) or
/// a case-insensitive substring rule (`exact_match = false`). These are two
/// distinct rules and must not be merged.
pub fn find_issue_by_field<'a>(
  issues: &'a [Value],
  field_name: &str,
  field_value: &Value,
  exact_match: bool,
) -> Option<&'a Value> {
  issues.iter().find(|issue| {
    let Some(obj) = issue.as_object() else { return false };
    let Some(issue_value) = obj.get(field_name) else { return false };
    if exact_match {
      matches_trimmed_ci(issue_value, field_value)
    } else {
      matches_contains_ci(issue_value, field_value)
    }
  })
}

/// All-matches variant of [`find_issue_by_field`].
pub fn find_all_issues_by_field<'a>(
  issues: &'a [Value],
  field_name: &str,
  field_value: &Value,
  exact_match: bool,
) -> Vec<&'a Value> {
  issues
    .iter()
    .filter(|issue| {
      let Some(obj) = issue.as_object() else { return false };
      let Some(issue_value) = obj.get(field_name) else { return false };
      if exact_match {
        matches_trimmed_ci(issue_value, field_value)
      } else {
        matches_contains_ci(issue_value, field_value)
      }
    })
    .collect()
}

/// Groups issues by a field's string representation. Missing, null, or
/// empty-string values collapse into [`NONE_BUCKET`].
pub fn group_by_field<'a>(issues: &'a [Value], field_name: &str) -> BTreeMap<String, Vec<&'a Value>> {
  let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
  for issue in issues {
    let Some(obj) = issue.as_object() else { continue };
    let key = match obj.get(field_name) {
      None => NONE_BUCKET.to_string(),
      Some(Value::Null) => NONE_BUCKET.to_string(),
      Some(Value::String(s)) if s.is_empty() => NONE_BUCKET.to_string(),
      Some(other) => field_as_str(other).unwrap_or_else(|| NONE_BUCKET.to_string()),
    };
    groups.entry(key).or_default().push(issue);
  }
  groups
}

/// Counts issues per distinct value of a field, using the same
/// [`NONE_BUCKET`] fallback as [`group_by_field`].
pub fn count_by_field(issues: &[Value], field_name: &str) -> BTreeMap<String, usize> {
  group_by_field(issues, field_name)
    .into_iter()
    .map(|(k, v)| (k, v.len()))
    .collect()
}

/// Conjunctive filter: every condition in `conditions` must hold, using
/// the trimmed, case-insensitive equality rule (list fields match if any
/// element equals the target).
pub fn filter_issues<'a>(issues: &'a [Value], conditions: &Map<String, Value>) -> Vec<&'a Value> {
  issues
    .iter()
    .filter(|issue| {
      let Some(obj) = issue.as_object() else { return false };
      conditions.iter().all(|(field, expected)| {
        let actual = obj.get(field).cloned().unwrap_or(Value::Null);
        matches_trimmed_ci(&actual, expected)
      })
    })
    .collect()
}

/// Stable sort by a named field; issues missing the field sort last
/// regardless of direction.
pub fn sort_issues(issues: &[Value], field_name: &str, descending: bool) -> Vec<Value> {
  let mut with_key: Vec<(Option<String>, Value)> = issues
    .iter()
    .map(|issue| {
      let key = issue
        .as_object()
        .and_then(|obj| obj.get(field_name))
        .and_then(field_as_str);
      (key, issue.clone())
    })
    .collect();

  with_key.sort_by(|(a, _), (b, _)| match (a, b) {
    (None, None) => std::cmp::Ordering::Equal,
    (None, Some(_)) => std::cmp::Ordering::Greater,
    (Some(_), None) => std::cmp::Ordering::Less,
    (Some(a), Some(b)) => {
      let ord = a.cmp(b);
      if descending {
        ord.reverse()
      } else {
        ord
      }
    }
  });

  with_key.into_iter().map(|(_, issue)| issue).collect()
}

/// Order-preserving collection of one field's values, with optional
/// first-occurrence de-duplication.
pub fn extract_field_values(issues: &[Value], field_name: &str, dedupe: bool) -> Vec<Value> {
  let mut values = Vec::new();
  let mut seen = std::collections::HashSet::new();
  for issue in issues {
    let Some(obj) = issue.as_object() else { continue };
    let Some(value) = obj.get(field_name) else { continue };
    if value.is_null() {
      continue;
    }
    if dedupe {
      let key = value.to_string();
      if !seen.insert(key) {
        continue;
      }
    }
    values.push(value.clone());
  }
  values
}

/// Scans `text` for a version number. Tries, in order: `v1.2.3`-style
/// prefixes, localized `버전 1.2` / `version 1.2` phrases, then bare
/// `1.2.3` or `1.2` tokens.
pub fn extract_version(text: &str) -> Option<String> {
  const PATTERNS: &[&str] = &[
    r"[vV](\d+\.\d+(?:\.\d+)?)",
    r"버전\s*(\d+\.\d+(?:\.\d+)?)",
    r"(?i)version\s*(\d+\.\d+(?:\.\d+)?)",
    r"\b(\d+\.\d+\.\d+)\b",
    r"\b(\d+\.\d+)\b",
  ];
  for pattern in PATTERNS {
    if let Ok(re) = Regex::new(pattern) {
      if let Some(caps) = re.captures(text) {
        if let Some(m) = caps.get(1) {
          return Some(m.as_str().to_string());
        }
      }
    }
  }
  None
}

/// Extracts the first match of `pattern` in `text`, returning capture
/// group `group` (0 = whole match).
pub fn extract_pattern(text: &str, pattern: &str, group: usize) -> Option<String> {
  let re = Regex::new(pattern).ok()?;
  let caps = re.captures(text)?;
  caps.get(group).map(|m| m.as_str().to_string())
}

/// Every match of `pattern` in `text`, in order of occurrence.
pub fn extract_all_patterns(text: &str, pattern: &str) -> Vec<String> {
  let Ok(re) = Regex::new(pattern) else { return Vec::new() };
  re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

const DATE_INPUT_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d",
  "%Y/%m/%d",
  "%d-%m-%Y",
  "%d/%m/%Y",
  "%m-%d-%Y",
  "%m/%d/%Y",
];

/// Reformats a date string through the output pattern. Returns the input
/// unchanged (with a logged warning) if none of the known input formats
/// parse it.
pub fn format_date(date_str: &str, output_format: &str) -> String {
  for input_format in DATE_INPUT_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, input_format) {
      return dt.format(output_format).to_string();
    }
    let with_midnight = format!("{date_str}T00:00:00");
    if *input_format == "%Y-%m-%d" {
      if let Ok(dt) = NaiveDateTime::parse_from_str(&with_midnight, "%Y-%m-%dT%H:%M:%S") {
        return dt.format(output_format).to_string();
      }
    }
  }
  warn!(date_str, "format_date: unparseable input, returning unchanged");
  date_str.to_string()
}

/// Collapses runs of whitespace to single spaces and trims the ends.
pub fn clean_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates at a character boundary, appending `suffix` only if
/// truncation actually occurred.
pub fn truncate_text(text: &str, max_len: usize, suffix: &str) -> String {
  let char_count = text.chars().count();
  if char_count <= max_len {
    return text.to_string();
  }
  let suffix_len = suffix.chars().count();
  if suffix_len >= max_len {
    return suffix.chars().take(max_len).collect();
  }
  let keep = max_len - suffix_len;
  let truncated: String = text.chars().take(keep).collect();
  format!("{truncated}{suffix}")
}

/// Extracts a system name from one issue: an underscore-containing label
/// wins outright (preserving `NCMS_BMT` vs `NCMS_Admin`); else a fully
/// uppercase label; else a `[NAME]`, `NAME:`, or `NAME -` pattern in the
/// summary; else the literal fallback `기타` ("Other").
pub fn extract_system_name(issue: &Value) -> String {
  let Some(obj) = issue.as_object() else {
    return "기타".to_string();
  };

  if let Some(Value::Array(labels)) = obj.get("labels") {
    for label in labels {
      if let Some(label) = label.as_str() {
        if label.contains('_') {
          return label.to_string();
        }
      }
    }
    for label in labels {
      if let Some(label) = label.as_str() {
        if label.len() >= 3
          && label.chars().any(|c| c.is_alphabetic())
          && label.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
        {
          return label.to_string();
        }
      }
    }
  }

  if let Some(Value::String(summary)) = obj.get("summary") {
    if let Ok(re) = Regex::new(r"\[([A-Z_]+)\]") {
      if let Some(caps) = re.captures(summary) {
        return caps[1].to_string();
      }
    }
    if let Ok(re) = Regex::new(r"^([A-Z_]+):") {
      if let Some(caps) = re.captures(summary) {
        return caps[1].to_string();
      }
    }
    if let Ok(re) = Regex::new(r"^([A-Z_]+)\s*-") {
      if let Some(caps) = re.captures(summary) {
        return caps[1].to_string();
      }
    }
  }

  "기타".to_string()
}

/// Groups issues by [`extract_system_name`].
pub fn group_by_system(issues: &[Value]) -> BTreeMap<String, Vec<&Value>> {
  let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
  for issue in issues {
    groups.entry(extract_system_name(issue)).or_default().push(issue);
  }
  groups
}

#[derive(Debug, Clone)]
pub struct SystemStats {
  pub count: usize,
  pub completed: usize,
  pub completion_rate: f64,
  pub statuses: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SystemSummary {
  pub systems: BTreeMap<String, SystemStats>,
  pub largest_system: Option<String>,
  pub smallest_system: Option<String>,
}

fn is_completed_status(status: &str) -> bool {
  matches!(
    status.to_lowercase().as_str(),
    "done" | "완료" | "closed" | "resolved"
  )
}

/// Per-system counts, completion counts, and status histograms.
pub fn get_system_summary(issues: &[Value]) -> SystemSummary {
  let groups = group_by_system(issues);
  let mut systems = BTreeMap::new();

  for (system_name, system_issues) in &groups {
    let mut statuses: BTreeMap<String, usize> = BTreeMap::new();
    let mut completed = 0;
    for issue in system_issues {
      let status = issue
        .as_object()
        .and_then(|obj| obj.get("status"))
        .and_then(|v| v.as_str())
        .unwrap_or("알 수 없음")
        .to_string();
      if is_completed_status(&status) {
        completed += 1;
      }
      *statuses.entry(status).or_insert(0) += 1;
    }
    let count = system_issues.len();
    let completion_rate = if count > 0 { completed as f64 / count as f64 * 100.0 } else { 0.0 };
    systems.insert(
      system_name.clone(),
      SystemStats {
        count,
        completed,
        completion_rate,
        statuses,
      },
    );
  }

  let largest_system = systems.iter().max_by_key(|(_, s)| s.count).map(|(k, _)| k.clone());
  let smallest_system = systems.iter().min_by_key(|(_, s)| s.count).map(|(k, _)| k.clone());

  SystemSummary {
    systems,
    largest_system,
    smallest_system,
  }
}

/// Renders a markdown table of `data`, restricted to `columns`.
pub fn format_as_table(data: &[Value], columns: &[&str], max_width: usize) -> String {
  if data.is_empty() || columns.is_empty() {
    return "| (no data) |\n|-----------|".to_string();
  }

  let cell = |value: Option<&Value>| -> String {
    let s = match value {
      None | Some(Value::Null) => "-".to_string(),
      Some(Value::Array(items)) => items.iter().map(value_to_plain_string).collect::<Vec<_>>().join(", "),
      Some(other) => value_to_plain_string(other),
    };
    if s.chars().count() > max_width {
      let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
      format!("{truncated}...")
    } else {
      s
    }
  };

  let mut widths: BTreeMap<&str, usize> = columns.iter().map(|c| (*c, c.len())).collect();
  let rows: Vec<Vec<String>> = data
    .iter()
    .map(|item| {
      columns
        .iter()
        .map(|col| {
          let rendered = cell(item.as_object().and_then(|o| o.get(*col)));
          let width = widths.get_mut(col).unwrap();
          *width = (*width).max(rendered.chars().count());
          rendered
        })
        .collect()
    })
    .collect();

  let mut lines = Vec::with_capacity(rows.len() + 2);
  lines.push(format!(
    "| {} |",
    columns.iter().map(|c| pad(c, widths[c])).collect::<Vec<_>>().join(" | ")
  ));
  lines.push(format!(
    "| {} |",
    columns.iter().map(|c| "-".repeat(widths[c])).collect::<Vec<_>>().join(" | ")
  ));
  for row in &rows {
    lines.push(format!(
      "| {} |",
      row
        .iter()
        .zip(columns.iter())
        .map(|(cell, col)| pad(cell, widths[col]))
        .collect::<Vec<_>>()
        .join(" | ")
    ));
  }
  lines.join("\n")
}

fn pad(s: &str, width: usize) -> String {
  let len = s.chars().count();
  if len >= width {
    s.to_string()
  } else {
    format!("{s}{}", " ".repeat(width - len))
  }
}

fn value_to_plain_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Renders each item via a `{field}`-style template, one bullet per line.
/// Items that don't satisfy the template's placeholders are skipped.
pub fn format_as_list(data: &[Value], template: &str, bullet: &str) -> String {
  let mut lines = Vec::new();
  for item in data {
    let Some(obj) = item.as_object() else { continue };
    if let Some(rendered) = render_template(template, obj) {
      lines.push(format!("{bullet}{rendered}"));
    }
  }
  if lines.is_empty() {
    "(no data to format)".to_string()
  } else {
    lines.join("\n")
  }
}

fn render_template(template: &str, obj: &Map<String, Value>) -> Option<String> {
  let mut out = String::new();
  let mut rest = template;
  while let Some(start) = rest.find('{') {
    let end = rest[start..].find('}')? + start;
    out.push_str(&rest[..start]);
    let key = &rest[start + 1..end];
    let value = obj.get(key)?;
    out.push_str(&value_to_plain_string(value));
    rest = &rest[end + 1..];
  }
  out.push_str(rest);
  Some(out)
}

/// Pretty-printed JSON rendering of any tool result.
pub fn format_as_json(data: &Value) -> String {
  serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// RFC 4180-ish CSV rendering: comma-separated, quoting fields that
/// contain the delimiter, a double quote, or a newline.
pub fn format_as_csv(data: &[Value], columns: &[&str]) -> String {
  if data.is_empty() || columns.is_empty() {
    return "(no data)".to_string();
  }
  let escape = |s: &str| -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
      format!("\"{}\"", s.replace('"', "\"\""))
    } else {
      s.to_string()
    }
  };
  let mut lines = vec![columns.join(",")];
  for item in data {
    let Some(obj) = item.as_object() else { continue };
    let row: Vec<String> = columns
      .iter()
      .map(|col| match obj.get(*col) {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => escape(&items.iter().map(value_to_plain_string).collect::<Vec<_>>().join(";")),
        Some(other) => escape(&value_to_plain_string(other)),
      })
      .collect();
    lines.push(row.join(","));
  }
  lines.join("\n")
}

/// Short natural-language-ish summary: total count, plus an optional
/// grouped breakdown sorted by descending count.
pub fn format_as_summary(data: &[Value], group_by: Option<&str>) -> String {
  if data.is_empty() {
    return "no data".to_string();
  }
  let total = data.len();
  let mut lines = vec![format!("{total} issues total")];

  if let Some(field) = group_by {
    let counts = count_by_field(data, field);
    if !counts.is_empty() {
      let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
      entries.sort_by(|a, b| b.1.cmp(a.1));
      lines.push(String::new());
      lines.push(format!("by {field}:"));
      for (key, count) in entries {
        let pct = *count as f64 / total as f64 * 100.0;
        lines.push(format!("- {key}: {count} ({pct:.1}%)"));
      }
    }
  }

  lines.join("\n")
}

/// `key: value` per line, with nested objects indented recursively.
pub fn format_key_value(data: &Map<String, Value>, indent: usize, separator: &str) -> String {
  let indent_str = " ".repeat(indent);
  let mut lines = Vec::new();
  for (key, value) in data {
    match value {
      Value::Object(nested) => {
        lines.push(format!("{indent_str}{key}:"));
        lines.push(format_key_value(nested, indent + 2, separator));
      }
      Value::Null => lines.push(format!("{indent_str}{key}{separator}(none)")),
      Value::Array(items) => {
        let joined = items.iter().map(value_to_plain_string).collect::<Vec<_>>().join(", ");
        lines.push(format!("{indent_str}{key}{separator}{joined}"));
      }
      other => lines.push(format!("{indent_str}{key}{separator}{}", value_to_plain_string(other))),
    }
  }
  lines.join("\n")
}

/// Greedy word-wrap to a fixed column width.
pub fn wrap_text(text: &str, width: usize, indent: usize) -> String {
  let indent_str = " ".repeat(indent);
  let usable = width.saturating_sub(indent);
  if usable == 0 {
    return text.to_string();
  }
  let mut lines = Vec::new();
  let mut current = String::new();
  for word in text.split_whitespace() {
    let candidate_len = if current.is_empty() {
      word.chars().count()
    } else {
      current.chars().count() + 1 + word.chars().count()
    };
    if candidate_len > usable && !current.is_empty() {
      lines.push(format!("{indent_str}{current}"));
      current = word.to_string();
    } else {
      if !current.is_empty() {
        current.push(' ');
      }
      current.push_str(word);
    }
  }
  if !current.is_empty() {
    lines.push(format!("{indent_str}{current}"));
  }
  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sample_issues() -> Vec<Value> {
    vec![
      json!({"key": "BTVO-123", "status": "신규", "assignee": "김철수", "labels": ["NCMS_BMT"]}),
      json!({"key": "BTVO-124", "status": "완료", "assignee": "김철수", "labels": ["NCMS_Admin"]}),
      json!({"key": "PROJ-456", "status": "신규", "assignee": "박영희", "labels": []}),
    ]
  }

  #[test]
  fn find_issue_by_field_exact_match_trims_and_ignores_case() {
    let issues = sample_issues();
    let found = find_issue_by_field(&issues, "status", &json!("  done  ".to_uppercase()), true);
    assert!(found.is_none()); // "DONE  " != 신규/완료, sanity check different field values
    let found = find_issue_by_field(&issues, "status", &json!("  완료  "), true);
    assert_eq!(found.unwrap()["key"], "BTVO-124");
  }

  #[test]
  fn find_issue_by_field_substring_mode_is_distinct_from_exact() {
    let issues = sample_issues();
    let found = find_issue_by_field(&issues, "key", &json!("BTVO"), false);
    assert_eq!(found.unwrap()["key"], "BTVO-123");
    let not_found = find_issue_by_field(&issues, "key", &json!("BTVO"), true);
    assert!(not_found.is_none());
  }

  #[test]
  fn group_by_field_buckets_missing_values_under_none_bucket() {
    let issues = vec![json!({"key": "A"}), json!({"key": "B", "assignee": null})];
    let groups = group_by_field(&issues, "assignee");
    assert_eq!(groups.get(NONE_BUCKET).unwrap().len(), 2);
  }

  #[test]
  fn filter_issues_matches_list_field_case_insensitively() {
    let issues = sample_issues();
    let mut conditions = Map::new();
    conditions.insert("labels".to_string(), json!("ncms_bmt"));
    let filtered = filter_issues(&issues, &conditions);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["key"], "BTVO-123");
  }

  #[test]
  fn sort_issues_puts_missing_field_last() {
    let issues = vec![json!({"key": "A", "priority": "Low"}), json!({"key": "B"}), json!({"key": "C", "priority": "High"})];
    let sorted = sort_issues(&issues, "priority", false);
    assert_eq!(sorted.last().unwrap()["key"], "B");
  }

  #[test]
  fn extract_field_values_dedupes_preserving_first_occurrence_order() {
    let issues = sample_issues();
    let values = extract_field_values(&issues, "assignee", true);
    assert_eq!(values, vec![json!("김철수"), json!("박영희")]);
  }

  #[test]
  fn extract_version_finds_v_prefixed_version() {
    assert_eq!(extract_version("Release v1.2.3"), Some("1.2.3".to_string()));
  }

  #[test]
  fn extract_all_patterns_finds_every_match() {
    let matches = extract_all_patterns("BTVO-123, PROJ-456", r"[A-Z]+-\d+");
    assert_eq!(matches, vec!["BTVO-123".to_string(), "PROJ-456".to_string()]);
  }

  #[test]
  fn format_date_reformats_parseable_input() {
    assert_eq!(format_date("2025-10-15T10:30:00", "%Y-%m-%d"), "2025-10-15");
  }

  #[test]
  fn format_date_returns_input_unchanged_when_unparseable() {
    assert_eq!(format_date("not a date", "%Y-%m-%d"), "not a date");
  }

  #[test]
  fn clean_whitespace_collapses_runs() {
    assert_eq!(clean_whitespace("  hello   world  "), "hello world");
  }

  #[test]
  fn truncate_text_only_appends_suffix_when_truncated() {
    assert_eq!(truncate_text("Short", 10, "..."), "Short");
    assert_eq!(truncate_text("This is a long text", 10, "..."), "This is...");
  }

  #[test]
  fn extract_system_name_prefers_underscore_label() {
    let issue = json!({"labels": ["NCMS_BMT"]});
    assert_eq!(extract_system_name(&issue), "NCMS_BMT");
  }

  #[test]
  fn extract_system_name_skips_numeric_label_and_falls_back_to_bracket_pattern() {
    let issue = json!({"labels": ["2024"], "summary": "[BTV] release train"});
    assert_eq!(extract_system_name(&issue), "BTV");
  }

  #[test]
  fn extract_system_name_falls_back_to_bracket_pattern_in_summary() {
    let issue = json!({"summary": "[BTV] login bug"});
    assert_eq!(extract_system_name(&issue), "BTV");
  }

  #[test]
  fn extract_system_name_falls_back_to_other_literal() {
    let issue = json!({"summary": "general task"});
    assert_eq!(extract_system_name(&issue), "기타");
  }

  #[test]
  fn format_as_table_renders_header_and_rows() {
    let data = vec![json!({"key": "BTVO-123", "status": "신규"})];
    let table = format_as_table(&data, &["key", "status"], 50);
    assert!(table.starts_with("| key"));
    assert!(table.contains("BTVO-123"));
  }

  #[test]
  fn format_as_csv_quotes_fields_with_commas() {
    let data = vec![json!({"key": "A", "summary": "has, comma"})];
    let csv = format_as_csv(&data, &["key", "summary"]);
    assert!(csv.contains("\"has, comma\""));
  }

  #[test]
  fn format_as_summary_reports_group_percentages() {
    let issues = sample_issues();
    let summary = format_as_summary(&issues, Some("status"));
    assert!(summary.contains("3 issues total"));
    assert!(summary.contains("by status"));
  }

  #[test]
  fn wrap_text_breaks_at_width() {
    let wrapped = wrap_text("one two three four", 8, 0);
    assert!(wrapped.lines().all(|l| l.len() <= 8));
  }
}
