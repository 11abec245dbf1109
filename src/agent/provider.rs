//! The LLM backend seam. Concrete providers (OpenAI-compatible APIs, local
//! models, etc.) implement this trait; the agent loop only ever talks to
//! it, never to a specific SDK.

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;
use async_trait::async_trait;

#[async_trait]
pub trait LlmProvider: Send + Sync {
  /// Identifies the provider in logs and error messages.
  fn name(&self) -> &str;

  async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}

#[cfg(test)]
pub mod test_support {
  use super::*;
  use super::super::message::TokenUsage;
  use super::super::tool::ToolCall;
  use std::sync::Mutex;

  /// A scripted provider: returns queued responses in order, recording
  /// every request it received for assertions.
  pub struct ScriptedProvider {
    responses: Mutex<Vec<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
  }

  impl ScriptedProvider {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
      Self {
        responses: Mutex::new(responses),
        requests: Mutex::new(Vec::new()),
      }
    }

    pub fn request_count(&self) -> usize {
      self.requests.lock().expect("lock poisoned").len()
    }

    pub fn text_response(content: &str) -> ChatResponse {
      ChatResponse {
        content: content.to_string(),
        usage: TokenUsage::default(),
        tool_calls: Vec::new(),
        finish_reason: Some("stop".to_string()),
      }
    }

    pub fn tool_call_response(calls: Vec<ToolCall>) -> ChatResponse {
      ChatResponse {
        content: String::new(),
        usage: TokenUsage::default(),
        tool_calls: calls,
        finish_reason: Some("tool_calls".to_string()),
      }
    }
  }

  #[async_trait]
  impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
      "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
      self.requests.lock().expect("lock poisoned").push(request.clone());
      let mut responses = self.responses.lock().expect("lock poisoned");
      if responses.is_empty() {
        return Err(AgentError::ModelError("scripted provider exhausted".to_string()));
      }
      Ok(responses.remove(0))
    }
  }
}
