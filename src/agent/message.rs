use serde::Deserialize;
use serde_json::Value;

/// One event of the agent's streamed response.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMessage {
    System {
        subtype: String,
        data: Value,
    },
    Assistant {
        model: Option<String>,
        content: Vec<ContentBlock>,
    },
    User {
        content: Vec<ContentBlock>,
    },
    Result(ResultSummary),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultSummary {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AgentMessage {
    /// Parses one line of the agent's stream-json output. Returns `Ok(None)`
    /// for message types this tool does not model.
    pub fn parse_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let message = match kind.as_str() {
            "system" => {
                let subtype = value
                    .get("subtype")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Self::System {
                    subtype,
                    data: value,
                }
            }
            "assistant" => {
                let raw: RawEnvelope = serde_json::from_value(value)?;
                Self::Assistant {
                    model: raw.message.model,
                    content: raw.message.content.into_blocks(),
                }
            }
            "user" => {
                let raw: RawEnvelope = serde_json::from_value(value)?;
                Self::User {
                    content: raw.message.content.into_blocks(),
                }
            }
            "result" => Self::Result(serde_json::from_value(value)?),
            _ => return Ok(None),
        };

        Ok(Some(message))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "SystemMessage",
            Self::Assistant { .. } => "AssistantMessage",
            Self::User { .. } => "UserMessage",
            Self::Result(_) => "ResultMessage",
        }
    }

    /// Text blocks of an assistant message, in order.
    pub fn assistant_text(&self) -> Vec<&str> {
        match self {
            Self::Assistant { content, .. } => content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    model: Option<String>,
    content: RawContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl RawContent {
    fn into_blocks(self) -> Vec<ContentBlock> {
        match self {
            Self::Text(text) => vec![ContentBlock::Text { text }],
            Self::Blocks(blocks) => blocks,
        }
    }
}
