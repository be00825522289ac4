use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::SettingSource;

pub const DEFAULT_RESPONSE_FILE: &str = "claude_full_response.txt";

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "prompt-probe")]
#[command(
    about = "Probe which system-prompt sources a coding agent honors, and in what order",
    long_about = "Probe which system-prompt sources a coding agent honors, and in what order\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/prompt-probe/config.toml\n    2. ~/.config/prompt-probe/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Write the run transcript here instead of the state directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub transcript: Option<PathBuf>,

    /// Agent CLI binary to drive (overrides config and PROMPT_PROBE_CLAUDE_BIN).
    #[arg(long, value_name = "PATH", global = true)]
    pub claude_bin: Option<PathBuf>,

    /// Directory holding external prompt files such as Design.md.
    #[arg(long, value_name = "DIR", global = true)]
    pub prompt_repo: Option<PathBuf>,

    /// Cap the agent's turns per query (overrides config `max_turns`).
    #[arg(
        long,
        value_name = "N",
        global = true,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_turns: Option<u32>,

    #[command(subcommand)]
    pub scenario: ScenarioArgs,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum ScenarioArgs {
    /// Trace which prompt files are read while a preset + project session starts.
    LoadingOrder {
        /// Setting sources to request, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "project")]
        sources: Vec<SettingSource>,
    },
    /// Ask the agent to report the prompt files it loaded and save the answer.
    Ask {
        /// File that receives the full response text.
        #[arg(long, value_name = "PATH", default_value = DEFAULT_RESPONSE_FILE)]
        output: PathBuf,
        /// Setting sources to request, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "project")]
        sources: Vec<SettingSource>,
    },
    /// Verify an external prompt file, then the preset with project settings.
    Verify {
        #[arg(long, value_name = "PATH")]
        prompt_file: Option<PathBuf>,
    },
    /// Use an external prompt and project settings at the same time.
    Combined {
        #[arg(long, value_name = "PATH")]
        prompt_file: Option<PathBuf>,
    },
    /// Append an external prompt to the preset, with project settings.
    Append {
        #[arg(long, value_name = "PATH")]
        prompt_file: Option<PathBuf>,
    },
    /// Run the Design agent with a prompt loaded from the prompt repository.
    Design {
        /// Task for the agent; a design-review task is used when omitted.
        #[arg(long)]
        task: Option<String>,
    },
}

impl ScenarioArgs {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadingOrder { .. } => "loading-order",
            Self::Ask { .. } => "ask",
            Self::Verify { .. } => "verify",
            Self::Combined { .. } => "combined",
            Self::Append { .. } => "append",
            Self::Design { .. } => "design",
        }
    }
}
