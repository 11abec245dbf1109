pub mod gateway;
pub mod types;

pub use gateway::JiraGateway;
pub use types::RawIssue;
