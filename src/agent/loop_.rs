//! Drives a language model through tool calls to a final textual answer.

use super::message::{assistant_tool_calls_message, tool_message, ChatMessage, ChatRequest};
use super::provider::LlmProvider;
use super::registry::ToolRegistry;
use super::tool::ToolSet;
use crate::error::AgentError;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Per-call instrumentation for one completed tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCallTrace {
  pub tool_name: String,
  pub duration: Duration,
  pub is_error: bool,
}

/// What a successful run returns: the model's final text, plus enough
/// observability to check whether the system prompt's mode discipline
/// (data-query vs insight) was actually followed.
#[derive(Debug, Clone)]
pub struct AgentRunOutcome {
  pub final_content: String,
  pub tool_usage: Vec<String>,
  pub call_traces: Vec<ToolCallTrace>,
  pub iterations: usize,
}

pub struct AgentLoopConfig {
  pub model: String,
  pub max_iterations: usize,
  pub turn_timeout: Duration,
}

impl Default for AgentLoopConfig {
  fn default() -> Self {
    Self {
      model: "gpt-4o-mini".to_string(),
      max_iterations: 8,
      turn_timeout: Duration::from_secs(30),
    }
  }
}

pub struct AgentLoop<'a> {
  provider: &'a dyn LlmProvider,
  registry: &'a ToolRegistry,
  config: AgentLoopConfig,
}

impl<'a> AgentLoop<'a> {
  pub fn new(provider: &'a dyn LlmProvider, registry: &'a ToolRegistry, config: AgentLoopConfig) -> Self {
    Self {
      provider,
      registry,
      config,
    }
  }

  /// Runs the loop to completion starting from `messages` (expected to
  /// begin with a system message establishing data-query/insight mode).
  #[instrument(skip(self, messages), fields(model = %self.config.model))]
  pub async fn run(&self, mut messages: Vec<ChatMessage>) -> Result<AgentRunOutcome, AgentError> {
    let tools = ToolSet::jira_tools().tools;
    let mut tool_usage = Vec::new();
    let mut call_traces = Vec::new();

    for iteration in 1..=self.config.max_iterations {
      let request = ChatRequest {
        model: self.config.model.clone(),
        messages: messages.clone(),
        temperature: None,
        max_tokens: None,
        json_mode: false,
        stream: false,
        tools: tools.clone(),
      };

      let response = tokio::time::timeout(self.config.turn_timeout, self.provider.chat(&request))
        .await
        .map_err(|_| AgentError::Timeout)??;

      if response.tool_calls.is_empty() {
        info!(iterations = iteration, tools_used = ?tool_usage, "agent loop finished");
        return Ok(AgentRunOutcome {
          final_content: response.content,
          tool_usage,
          call_traces,
          iterations: iteration,
        });
      }

      messages.push(assistant_tool_calls_message(response.tool_calls.clone()));

      for call in &response.tool_calls {
        let started = Instant::now();
        let result = self.registry.execute(call).await;
        let duration = started.elapsed();

        if result.is_error {
          warn!(tool_name = %call.name, error = %result.content, "tool call failed");
        }

        tool_usage.push(call.name.clone());
        call_traces.push(ToolCallTrace {
          tool_name: call.name.clone(),
          duration,
          is_error: result.is_error,
        });

        messages.push(tool_message(&call.id, &result.content));
      }
    }

    warn!(max_iterations = self.config.max_iterations, "agent loop exceeded max_iterations");
    Err(AgentError::MaxIterationsExceeded {
      max_iterations: self.config.max_iterations,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::message::{system_message, user_message};
  use crate::agent::provider::test_support::ScriptedProvider;
  use crate::agent::tool::ToolCall;
  use crate::cache::RequestCache;
  use crate::jira::gateway::JiraGateway;
  use std::sync::Arc;

  fn registry() -> ToolRegistry {
    let gateway = JiraGateway::new("https://x.atlassian.net", "tok", Duration::from_secs(30)).unwrap();
    ToolRegistry::new(Arc::new(RequestCache::new(gateway)))
  }

  #[tokio::test]
  async fn single_final_message_terminates_in_one_iteration() {
    let provider = ScriptedProvider::new(vec![ScriptedProvider::text_response("the answer")]);
    let registry = registry();
    let agent = AgentLoop::new(&provider, &registry, AgentLoopConfig::default());
    let outcome = agent
      .run(vec![system_message("mode: insight"), user_message("hello")])
      .await
      .unwrap();
    assert_eq!(outcome.final_content, "the answer");
    assert_eq!(outcome.iterations, 1);
    assert!(outcome.tool_usage.is_empty());
  }

  #[tokio::test]
  async fn one_tool_call_then_final_message_yields_expected_trace() {
    let tool_call = ToolCall {
      id: "call_1".to_string(),
      name: "extract_version".to_string(),
      arguments: r#"{"text": "v1.0.0"}"#.to_string(),
    };
    let provider = ScriptedProvider::new(vec![
      ScriptedProvider::tool_call_response(vec![tool_call]),
      ScriptedProvider::text_response("version is 1.0.0"),
    ]);
    let registry = registry();
    let agent = AgentLoop::new(&provider, &registry, AgentLoopConfig::default());
    let outcome = agent
      .run(vec![system_message("mode: data-query"), user_message("what version?")])
      .await
      .unwrap();
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.tool_usage, vec!["extract_version".to_string()]);
    assert_eq!(outcome.final_content, "version is 1.0.0");
  }

  #[tokio::test]
  async fn exceeding_max_iterations_is_a_structured_failure() {
    let tool_call = ToolCall {
      id: "call_1".to_string(),
      name: "extract_version".to_string(),
      arguments: r#"{"text": "v1.0.0"}"#.to_string(),
    };
    let responses: Vec<_> = (0..5)
      .map(|_| ScriptedProvider::tool_call_response(vec![tool_call.clone()]))
      .collect();
    let provider = ScriptedProvider::new(responses);
    let registry = registry();
    let config = AgentLoopConfig {
      max_iterations: 3,
      ..AgentLoopConfig::default()
    };
    let agent = AgentLoop::new(&provider, &registry, config);
    let result = agent.run(vec![user_message("loop forever")]).await;
    assert!(matches!(result, Err(AgentError::MaxIterationsExceeded { max_iterations: 3 })));
  }
}
