use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::client::{AgentClient, AgentError, AgentResult, MessageStream};
use super::message::AgentMessage;
use super::options::AgentOptions;

const STDERR_LIMIT_CHARS: usize = 400;

/// Runs one agent CLI process per query and streams its stream-json output.
#[derive(Debug, Clone)]
pub struct ClaudeCliClient {
    binary: PathBuf,
}

impl ClaudeCliClient {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl AgentClient for ClaudeCliClient {
    type Stream = ClaudeCliStream;

    fn query(&self, prompt: &str, options: &AgentOptions) -> AgentResult<ClaudeCliStream> {
        let args = options.to_cli_args(prompt);
        debug!(binary = %self.binary.display(), ?args, "spawning agent CLI");

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                AgentError::CliNotFound {
                    binary: self.binary.display().to_string(),
                }
            } else {
                AgentError::Spawn(err.to_string())
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Spawn("agent stdout was not captured".to_string()))?;
        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                if let Err(err) = stderr.read_to_string(&mut text).await {
                    debug!(%err, captured = text.len(), "agent stderr read stopped early");
                }
                text
            })
        });

        Ok(ClaudeCliStream {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr,
            finished: false,
        })
    }
}

pub struct ClaudeCliStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
}

impl ClaudeCliStream {
    async fn finish(&mut self) -> AgentResult<()> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .await
            .map_err(|err| AgentError::Io(err.to_string()))?;
        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            if !stderr.trim().is_empty() {
                debug!(stderr = %stderr.trim(), "agent CLI wrote to stderr");
            }
            return Ok(());
        }

        Err(AgentError::ProcessFailed {
            status: status.to_string(),
            stderr: stderr.trim().chars().take(STDERR_LIMIT_CHARS).collect(),
        })
    }
}

impl MessageStream for ClaudeCliStream {
    async fn next_message(&mut self) -> AgentResult<Option<AgentMessage>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.finish().await?;
                    return Ok(None);
                }
                Err(err) => {
                    self.finished = true;
                    return Err(AgentError::Io(err.to_string()));
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match AgentMessage::parse_line(trimmed) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => debug!(line = trimmed, "skipping unmodeled agent message"),
                Err(err) => {
                    warn!(%err, "agent emitted an unparseable line");
                    self.finished = true;
                    return Err(AgentError::Parse {
                        line: trimmed.chars().take(200).collect(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}
