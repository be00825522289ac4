use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const CLAUDE_CODE_PRESET: &str = "claude_code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemPromptSource {
    Preset(String),
    Literal(String),
    PresetWithAppend { preset: String, append: String },
}

impl SystemPromptSource {
    pub fn claude_code() -> Self {
        Self::Preset(CLAUDE_CODE_PRESET.to_string())
    }

    pub fn claude_code_with_append(append: impl Into<String>) -> Self {
        Self::PresetWithAppend {
            preset: CLAUDE_CODE_PRESET.to_string(),
            append: append.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Preset(preset) => format!("preset '{preset}'"),
            Self::Literal(text) => format!("literal ({} chars)", text.chars().count()),
            Self::PresetWithAppend { preset, append } => format!(
                "preset '{preset}' + appended literal ({} chars)",
                append.chars().count()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingSource {
    User,
    Project,
    Local,
}

impl SettingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Local => "local",
        }
    }
}

impl FromStr for SettingSource {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "project" => Ok(Self::Project),
            "local" => Ok(Self::Local),
            _ => Err(format!("unknown setting source '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    #[default]
    Default,
    AcceptEdits,
    Plan,
    BypassPermissions,
}

impl PermissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::Plan => "plan",
            Self::BypassPermissions => "bypassPermissions",
        }
    }
}

impl Display for PermissionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentOptions {
    pub system_prompt: Option<SystemPromptSource>,
    pub setting_sources: Vec<SettingSource>,
    pub allowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub cwd: Option<PathBuf>,
}

impl AgentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, source: SystemPromptSource) -> Self {
        self.system_prompt = Some(source);
        self
    }

    pub fn with_setting_sources(mut self, sources: &[SettingSource]) -> Self {
        self.setting_sources = sources.to_vec();
        self
    }

    pub fn with_allowed_tools(mut self, tools: &[&str]) -> Self {
        self.allowed_tools = tools.iter().map(|tool| (*tool).to_string()).collect();
        self
    }

    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_max_turns(mut self, max_turns: Option<u32>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    /// Command-line flags understood by the agent CLI in print mode, followed
    /// by the prompt itself.
    pub fn to_cli_args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec![
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];

        match &self.system_prompt {
            None => {
                args.push("--system-prompt".to_string());
                args.push(String::new());
            }
            Some(SystemPromptSource::Literal(text)) => {
                args.push("--system-prompt".to_string());
                args.push(text.clone());
            }
            Some(SystemPromptSource::Preset(_)) => {}
            Some(SystemPromptSource::PresetWithAppend { append, .. }) => {
                args.push("--append-system-prompt".to_string());
                args.push(append.clone());
            }
        }

        if !self.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.allowed_tools.join(","));
        }

        args.push("--permission-mode".to_string());
        args.push(self.permission_mode.to_string());

        args.push("--setting-sources".to_string());
        args.push(
            self.setting_sources
                .iter()
                .map(|source| source.as_str())
                .collect::<Vec<_>>()
                .join(","),
        );

        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(max_turns) = self.max_turns {
            args.push("--max-turns".to_string());
            args.push(max_turns.to_string());
        }

        args.push("--print".to_string());
        args.push("--".to_string());
        args.push(prompt.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentOptions, PermissionMode, SettingSource, SystemPromptSource};

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|index| args.get(index + 1))
            .map(String::as_str)
    }

    #[test]
    fn preset_with_project_sources_maps_to_cli_flags() {
        let options = AgentOptions::new()
            .with_system_prompt(SystemPromptSource::claude_code())
            .with_setting_sources(&[SettingSource::Project])
            .with_allowed_tools(&["Read", "Write"])
            .with_permission_mode(PermissionMode::AcceptEdits);

        let args = options.to_cli_args("hello");
        assert!(!args.iter().any(|arg| arg == "--system-prompt"));
        assert!(!args.iter().any(|arg| arg == "--append-system-prompt"));
        assert_eq!(flag_value(&args, "--allowedTools"), Some("Read,Write"));
        assert_eq!(flag_value(&args, "--permission-mode"), Some("acceptEdits"));
        assert_eq!(flag_value(&args, "--setting-sources"), Some("project"));
        assert_eq!(flag_value(&args, "--output-format"), Some("stream-json"));
        assert_eq!(&args[args.len() - 3..], ["--print", "--", "hello"]);
    }

    #[test]
    fn literal_prompt_replaces_system_prompt() {
        let options =
            AgentOptions::new().with_system_prompt(SystemPromptSource::Literal("You design.".into()));
        let args = options.to_cli_args("task");
        assert_eq!(flag_value(&args, "--system-prompt"), Some("You design."));
        assert_eq!(flag_value(&args, "--setting-sources"), Some(""));
        assert_eq!(flag_value(&args, "--permission-mode"), Some("default"));
    }

    #[test]
    fn append_mode_uses_append_flag() {
        let options = AgentOptions::new()
            .with_system_prompt(SystemPromptSource::claude_code_with_append("Extra rules"));
        let args = options.to_cli_args("task");
        assert_eq!(flag_value(&args, "--append-system-prompt"), Some("Extra rules"));
        assert!(!args.iter().any(|arg| arg == "--system-prompt"));
    }

    #[test]
    fn missing_system_prompt_passes_empty_prompt() {
        let args = AgentOptions::new().to_cli_args("task");
        assert_eq!(flag_value(&args, "--system-prompt"), Some(""));
        assert!(!args.iter().any(|arg| arg == "--allowedTools"));
    }

    #[test]
    fn optional_model_and_turns_are_forwarded() {
        let options = AgentOptions::new()
            .with_model(Some("sonnet".to_string()))
            .with_max_turns(Some(3));
        let args = options.to_cli_args("task");
        assert_eq!(flag_value(&args, "--model"), Some("sonnet"));
        assert_eq!(flag_value(&args, "--max-turns"), Some("3"));
    }

    #[test]
    fn prompt_starting_with_dashes_stays_positional() {
        let args = AgentOptions::new().to_cli_args("--help me");
        assert_eq!(args.last().map(String::as_str), Some("--help me"));
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn setting_source_parses_known_names() {
        assert_eq!("project".parse::<SettingSource>(), Ok(SettingSource::Project));
        assert!("global".parse::<SettingSource>().is_err());
    }

    #[test]
    fn describe_reports_prompt_shape() {
        assert_eq!(
            SystemPromptSource::claude_code().describe(),
            "preset 'claude_code'"
        );
        assert_eq!(
            SystemPromptSource::Literal("abc".into()).describe(),
            "literal (3 chars)"
        );
    }
}
