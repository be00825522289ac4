use std::error::Error;
use std::fmt::{Display, Formatter};

use super::message::AgentMessage;
use super::options::AgentOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    CliNotFound { binary: String },
    Spawn(String),
    Io(String),
    Parse { line: String, message: String },
    ProcessFailed { status: String, stderr: String },
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliNotFound { binary } => write!(
                f,
                "agent CLI '{binary}' not found; install it or set PROMPT_PROBE_CLAUDE_BIN"
            ),
            Self::Spawn(msg) => write!(f, "failed to start agent CLI: {msg}"),
            Self::Io(msg) => write!(f, "agent stream I/O error: {msg}"),
            Self::Parse { line, message } => {
                write!(f, "agent stream parse error: {message} (line: {line})")
            }
            Self::ProcessFailed { status, stderr } => {
                if stderr.is_empty() {
                    write!(f, "agent CLI exited with {status}")
                } else {
                    write!(f, "agent CLI exited with {status}: {stderr}")
                }
            }
        }
    }
}

impl Error for AgentError {}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// A finite, non-restartable sequence of messages for one query. Once it
/// has returned `Ok(None)` it keeps doing so.
pub trait MessageStream {
    fn next_message(
        &mut self,
    ) -> impl std::future::Future<Output = AgentResult<Option<AgentMessage>>> + Send;
}

pub trait AgentClient {
    type Stream: MessageStream + Send;

    fn query(&self, prompt: &str, options: &AgentOptions) -> AgentResult<Self::Stream>;
}

/// Drains `stream`, handing every message to `on_message`, and returns the
/// assistant text blocks in arrival order.
pub async fn collect_text<S, F>(stream: &mut S, mut on_message: F) -> AgentResult<Vec<String>>
where
    S: MessageStream + Send,
    F: FnMut(&AgentMessage) + Send,
{
    let mut texts = Vec::new();
    while let Some(message) = stream.next_message().await? {
        on_message(&message);
        texts.extend(message.assistant_text().into_iter().map(ToOwned::to_owned));
    }
    Ok(texts)
}
