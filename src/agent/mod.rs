mod claude_cli;
mod client;
mod message;
mod options;

pub use claude_cli::{ClaudeCliClient, ClaudeCliStream};
pub use client::{AgentClient, AgentError, AgentResult, MessageStream, collect_text};
pub use message::{AgentMessage, ContentBlock, ResultSummary};
pub use options::{
    AgentOptions, CLAUDE_CODE_PRESET, PermissionMode, SettingSource, SystemPromptSource,
};

#[cfg(test)]
pub(crate) use client::testing;
