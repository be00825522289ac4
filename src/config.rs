use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::access::AccessPatterns;

pub const DEFAULT_CLAUDE_BINARY: &str = "claude";
pub const DEFAULT_PROMPT_REPO: &str = "prompts-repo";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_DIR_NAME: &str = "prompt-probe";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub claude_binary: PathBuf,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub prompt_repo: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub log_level: String,
    pub trace_patterns: AccessPatterns,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(CONFIG_FILE_NAME),
            claude_binary: PathBuf::from(DEFAULT_CLAUDE_BINARY),
            model: None,
            max_turns: None,
            prompt_repo: PathBuf::from(DEFAULT_PROMPT_REPO),
            working_dir: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            trace_patterns: AccessPatterns::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    claude_binary: Option<String>,
    model: Option<String>,
    max_turns: Option<u32>,
    prompt_repo: Option<String>,
    working_dir: Option<String>,
    log_level: Option<String>,
    trace: Option<RawTraceConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTraceConfig {
    interesting: Option<Vec<String>>,
    excluded: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                path.to_path_buf()
            }
            None => discover_config_path()?,
        };
        let file_config = load_file_config(&config_path)?;

        // The agent CLI inherits the environment, so `.env` credentials reach it too.
        dotenvy::dotenv().ok();

        let trace_patterns = validate_trace(
            file_config.as_ref().and_then(|cfg| cfg.trace.as_ref()),
            &config_path,
        )?;

        let log_level = file_string(file_config.as_ref(), |cfg| cfg.log_level.as_deref())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        validate_log_level(&log_level, &config_path)?;

        let max_turns = file_config.as_ref().and_then(|cfg| cfg.max_turns);
        if max_turns == Some(0) {
            return Err(config_error(
                &config_path,
                "max_turns",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            claude_binary: env_non_empty("PROMPT_PROBE_CLAUDE_BIN")
                .or_else(|| {
                    file_string(file_config.as_ref(), |cfg| cfg.claude_binary.as_deref())
                })
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLAUDE_BINARY)),
            model: env_non_empty("PROMPT_PROBE_MODEL")
                .or_else(|| file_string(file_config.as_ref(), |cfg| cfg.model.as_deref())),
            max_turns,
            prompt_repo: file_string(file_config.as_ref(), |cfg| cfg.prompt_repo.as_deref())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPT_REPO)),
            working_dir: file_string(file_config.as_ref(), |cfg| cfg.working_dir.as_deref())
                .map(PathBuf::from),
            log_level,
            trace_patterns,
            config_path,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_trace(raw: Option<&RawTraceConfig>, config_path: &Path) -> Result<AccessPatterns> {
    let Some(raw) = raw else {
        return Ok(AccessPatterns::default());
    };

    let defaults = AccessPatterns::default();
    let interesting = match &raw.interesting {
        Some(values) => validate_pattern_list(values, config_path, "trace.interesting")?,
        None => defaults.interesting().to_vec(),
    };
    let excluded = match &raw.excluded {
        Some(values) => validate_pattern_list(values, config_path, "trace.excluded")?,
        None => defaults.excluded().to_vec(),
    };

    Ok(AccessPatterns::new(interesting, excluded))
}

fn validate_pattern_list(
    values: &[String],
    config_path: &Path,
    key_path: &str,
) -> Result<Vec<String>> {
    if values.is_empty() {
        return Err(config_error(config_path, key_path, "must not be empty"));
    }

    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            non_empty(value).map(ToOwned::to_owned).ok_or_else(|| {
                config_error(
                    config_path,
                    &format!("{key_path}[{index}]"),
                    "pattern must not be blank",
                )
            })
        })
        .collect()
}

fn validate_log_level(level: &str, config_path: &Path) -> Result<()> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
        _ => Err(config_error(
            config_path,
            "log_level",
            &format!("unknown level '{level}'"),
        )),
    }
}

fn file_string(
    file_config: Option<&RawFileConfig>,
    select: impl FnOnce(&RawFileConfig) -> Option<&str>,
) -> Option<String> {
    file_config
        .and_then(select)
        .and_then(non_empty)
        .map(ToOwned::to_owned)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
