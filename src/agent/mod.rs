//! The tool-calling agent surface: provider-agnostic message/tool types,
//! the built-in tool catalog, the registry that dispatches calls against
//! it, and the loop that drives a model through a conversation.

pub mod atomic_tools;
pub mod loop_;
pub mod message;
pub mod provider;
pub mod registry;
pub mod tool;

pub use loop_::{AgentLoop, AgentLoopConfig, AgentRunOutcome, ToolCallTrace};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role};
pub use provider::LlmProvider;
pub use registry::ToolRegistry;
pub use tool::{ToolCall, ToolDefinition, ToolResult, ToolSet};
