//! Probe scenarios: each one configures an agent session a particular way,
//! sends a query and reports what came back.

pub mod external;
pub mod inventory;
pub mod prompts;

use std::env;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::access::{
    AccessLog, AccessPatterns, FsOpener, ResourceOpener, TracedAccessEvent, TracedOpener,
};
use crate::agent::{
    AgentClient, AgentMessage, AgentOptions, PermissionMode, SettingSource, SystemPromptSource,
    collect_text,
};
use crate::cli::Console;
use crate::config::AppConfig;
use crate::trace::RunTrace;

pub use external::DesignAgent;

const DESIGN_PREVIEW_CHARS: usize = 200;
const PROMPT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub working_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub prompt_repo: PathBuf,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub trace_patterns: AccessPatterns,
}

impl ProbeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            working_dir: config.working_dir.clone(),
            home_dir: dirs::home_dir(),
            prompt_repo: config.prompt_repo.clone(),
            model: config.model.clone(),
            max_turns: config.max_turns,
            trace_patterns: config.trace_patterns.clone(),
        }
    }
}

/// How assistant output is shown on the console.
#[derive(Debug, Clone, Copy)]
enum Echo {
    Kinds,
    Full,
    Preview(usize),
}

pub struct Probe<C, W: Write> {
    client: C,
    console: Console<W>,
    trace: RunTrace,
    settings: ProbeSettings,
}

impl<C, W> Probe<C, W>
where
    C: AgentClient,
    W: Write + Send,
{
    pub fn new(client: C, console: Console<W>, trace: RunTrace, settings: ProbeSettings) -> Self {
        Self {
            client,
            console,
            trace,
            settings,
        }
    }

    pub fn into_console(self) -> Console<W> {
        self.console
    }

    /// Traces prompt-file reads while a preset session with `sources` is set
    /// up and queried. Returns the recorded reads in order.
    pub async fn loading_order(
        &mut self,
        sources: &[SettingSource],
    ) -> Result<Vec<TracedAccessEvent>> {
        let log = Arc::new(AccessLog::new());
        let tracer = TracedOpener::new(
            FsOpener,
            self.settings.trace_patterns.clone(),
            Arc::clone(&log),
        );

        let outcome = {
            let scope = tracer.scoped();
            self.run_loading_order(scope.opener(), &log, sources).await
        };

        let events = log.snapshot();
        match outcome {
            Ok(()) => {
                self.report_reads("All prompt files read (in order):", &events);
                Ok(events)
            }
            Err(err) => {
                self.report_reads("Files read before error:", &events);
                Err(err)
            }
        }
    }

    async fn run_loading_order<O>(
        &mut self,
        opener: &O,
        log: &AccessLog,
        sources: &[SettingSource],
    ) -> Result<()>
    where
        O: ResourceOpener,
        O::Handle: Read,
    {
        self.console.banner("Starting prompt loading investigation");

        let root = self.project_root()?;
        let candidates =
            inventory::candidate_paths(&root, self.settings.home_dir.as_deref(), sources);
        for file in inventory::scan(opener, &candidates)? {
            let line = format!(
                "[{}] {} ({} bytes): {}",
                file.source.as_str(),
                file.path.display(),
                file.bytes,
                file.first_line.as_deref().unwrap_or("<empty>")
            );
            info!(
                source = file.source.as_str(),
                path = %file.path.display(),
                bytes = file.bytes,
                "prompt source found"
            );
            self.trace.log_info(&line);
            self.console.text(&line);
        }
        self.report_reads("Prompt files read during setup (in order):", &log.snapshot());

        let options = self
            .base_options()
            .with_system_prompt(SystemPromptSource::claude_code())
            .with_setting_sources(sources)
            .with_allowed_tools(&["Read", "Write"]);
        self.console.text("Sending query to the agent...");
        self.run_query(prompts::LOADING_ORDER_PROMPT, &options, Echo::Kinds)
            .await?;
        Ok(())
    }

    /// Asks the agent which prompt files it loaded and saves the answer to
    /// `output`.
    pub async fn ask(&mut self, sources: &[SettingSource], output: &Path) -> Result<String> {
        self.console
            .banner("Asking the agent which prompt files it loaded");

        let options = self
            .base_options()
            .with_system_prompt(SystemPromptSource::claude_code())
            .with_setting_sources(sources)
            .with_allowed_tools(&["Read"]);
        let texts = self
            .run_query(prompts::ASK_PROMPT, &options, Echo::Full)
            .await?;

        let response = texts.join("\n");
        fs::write(output, &response).map_err(|err| {
            anyhow!(
                "Failed to write response to {}: {err}",
                output.display()
            )
        })?;
        let saved = format!("Full response saved to: {}", output.display());
        self.trace.log_info(&saved);
        self.console.banner(&saved);
        Ok(response)
    }

    /// Test 1 uses the external prompt file as the whole system prompt and
    /// fails when it is missing. Test 2 uses the preset with project
    /// settings; its failure is reported but does not fail the run.
    pub async fn verify(&mut self, prompt_file: Option<&Path>) -> Result<()> {
        self.console.section(
            "Prompt Loading Verification Tool",
            &[
                "This tool verifies:",
                "1. Loading an external prompt file as the system prompt",
                "2. Loading project prompt files through setting sources",
            ],
        );

        self.console
            .banner("TEST 1: Loading prompt from external file");
        let prompt_path = self.prompt_file(prompt_file);
        let prompt = external::load_prompt_file(&FsOpener, &prompt_path)?;
        self.report_loaded_prompt(&prompt_path, &prompt);

        let options = self
            .base_options()
            .with_system_prompt(SystemPromptSource::Literal(prompt))
            .with_allowed_tools(&["Read"]);
        self.console.banner("Agent's report on the loaded prompt");
        self.run_query(prompts::VERIFY_EXTERNAL_PROMPT, &options, Echo::Full)
            .await?;
        self.console.banner("Verification Complete");

        self.console
            .banner("TEST 2: Preset with project setting sources");
        let options = self
            .base_options()
            .with_system_prompt(SystemPromptSource::claude_code())
            .with_setting_sources(&[SettingSource::Project])
            .with_allowed_tools(&["Read"]);
        if let Err(err) = self
            .run_query(prompts::VERIFY_PRESET_PROMPT, &options, Echo::Full)
            .await
        {
            warn!("preset verification failed: {err:#}");
            self.trace.log_error(&format!("{err:#}"));
            self.console.text(&format!("Error: {err:#}"));
        }

        self.finish_banner("All verification tests completed");
        Ok(())
    }

    /// External prompt as the system prompt and project settings together.
    pub async fn combined(&mut self, prompt_file: Option<&Path>) -> Result<()> {
        self.console
            .banner("Combined test: external prompt + project settings");
        let prompt_path = self.prompt_file(prompt_file);
        let prompt = external::load_prompt_file(&FsOpener, &prompt_path)?;
        self.report_loaded_prompt(&prompt_path, &prompt);

        let options = self
            .base_options()
            .with_system_prompt(SystemPromptSource::Literal(prompt))
            .with_setting_sources(&[SettingSource::Project])
            .with_allowed_tools(&["Read"]);
        self.run_query(prompts::COMBINED_PROMPT, &options, Echo::Full)
            .await?;

        self.finish_banner("Combined test completed");
        Ok(())
    }

    /// External prompt appended to the preset, with project settings.
    pub async fn append(&mut self, prompt_file: Option<&Path>) -> Result<()> {
        self.console
            .banner("Append test: preset + external prompt + project settings");
        let prompt_path = self.prompt_file(prompt_file);
        let prompt = external::load_prompt_file(&FsOpener, &prompt_path)?;
        self.report_loaded_prompt(&prompt_path, &prompt);

        let options = self
            .base_options()
            .with_system_prompt(SystemPromptSource::claude_code_with_append(prompt))
            .with_setting_sources(&[SettingSource::Project])
            .with_allowed_tools(&["Read"]);
        self.run_query(prompts::APPEND_PROMPT, &options, Echo::Full)
            .await?;

        self.finish_banner("Append test completed");
        Ok(())
    }

    /// Runs `task` (or the default design review) with the Design agent.
    pub async fn design(&mut self, task: Option<&str>) -> Result<Vec<String>> {
        let agent = DesignAgent::load(&FsOpener, &self.settings.prompt_repo)?;
        info!(path = %agent.prompt_path().display(), "design prompt loaded");
        self.trace.log_info(&format!(
            "Loaded design prompt from {} ({} chars)",
            agent.prompt_path().display(),
            agent.system_prompt().chars().count()
        ));

        self.console.banner("Design Agent Example");
        let options = agent.options(self.base_options());
        let task = task.unwrap_or(prompts::DEFAULT_DESIGN_TASK);
        let texts = self
            .run_query(task, &options, Echo::Preview(DESIGN_PREVIEW_CHARS))
            .await?;

        self.finish_banner("Design agent finished");
        Ok(texts)
    }

    async fn run_query(
        &mut self,
        prompt: &str,
        options: &AgentOptions,
        echo: Echo,
    ) -> Result<Vec<String>> {
        let described = describe_options(options);
        info!(options = %described, "sending query");
        self.trace.log_options(&described);
        self.trace.log_prompt(prompt);

        let mut stream = self
            .client
            .query(prompt, options)
            .context("Failed to start agent query")?;

        let console = &mut self.console;
        let trace = &self.trace;
        let texts = collect_text(&mut stream, |message| {
            let kind = message.kind();
            trace.log_message_kind(kind);
            info!(kind, "message received");
            if let Echo::Kinds = echo {
                console.text(&format!("Message received: {kind}"));
            }

            if let AgentMessage::Result(summary) = message
                && summary.is_error
            {
                let detail = summary.result.as_deref().unwrap_or(&summary.subtype);
                warn!(subtype = %summary.subtype, "agent reported an error: {detail}");
                trace.log_error(&format!("agent result error: {detail}"));
            }

            for text in message.assistant_text() {
                trace.log_response(text);
                match echo {
                    Echo::Kinds => {}
                    Echo::Full => console.text(text),
                    Echo::Preview(limit) => {
                        console.text(&format!("Response: {}...", preview(text, limit)));
                    }
                }
            }
        })
        .await
        .context("Agent query failed")?;

        Ok(texts)
    }

    fn base_options(&self) -> AgentOptions {
        AgentOptions::new()
            .with_permission_mode(PermissionMode::AcceptEdits)
            .with_model(self.settings.model.clone())
            .with_max_turns(self.settings.max_turns)
            .with_cwd(self.settings.working_dir.clone())
    }

    fn project_root(&self) -> Result<PathBuf> {
        match &self.settings.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::current_dir().context("Failed to resolve the current directory"),
        }
    }

    fn prompt_file(&self, explicit: Option<&Path>) -> PathBuf {
        explicit.map_or_else(
            || external::default_prompt_file(&self.settings.prompt_repo),
            Path::to_path_buf,
        )
    }

    fn report_loaded_prompt(&mut self, path: &Path, prompt: &str) {
        let loaded = format!(
            "Loaded prompt from {} ({} chars)",
            path.display(),
            prompt.chars().count()
        );
        info!(path = %path.display(), "external prompt loaded");
        self.trace.log_info(&loaded);
        self.console.text(&loaded);
        self.console.text(&format!(
            "First {PROMPT_PREVIEW_CHARS} chars: {}...",
            preview(prompt, PROMPT_PREVIEW_CHARS)
        ));
    }

    fn report_reads(&mut self, title: &str, events: &[TracedAccessEvent]) {
        let lines: Vec<String> = events
            .iter()
            .map(|event| format!("{}. {}", event.sequence_number + 1, event.path))
            .collect();
        for event in events {
            self.trace.log_file_read(event);
        }
        if lines.is_empty() {
            self.console.section(title, &["(none)"]);
        } else {
            let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
            self.console.section(title, &borrowed);
        }
    }

    fn finish_banner(&mut self, title: &str) {
        let transcript = format!("Transcript: {}", self.trace.file_path().display());
        self.console.section(title, &[&transcript]);
    }
}

fn describe_options(options: &AgentOptions) -> String {
    let system_prompt = options
        .system_prompt
        .as_ref()
        .map_or_else(|| "none".to_string(), SystemPromptSource::describe);
    let sources: Vec<&str> = options
        .setting_sources
        .iter()
        .map(|source| source.as_str())
        .collect();
    format!(
        "system_prompt={system_prompt} setting_sources=[{}] allowed_tools=[{}] permission_mode={}",
        sources.join(","),
        options.allowed_tools.join(","),
        options.permission_mode
    )
}

fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
