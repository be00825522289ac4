pub mod access;
pub mod agent;
pub mod cli;
pub mod config;
pub mod probe;
pub mod trace;

use agent::{AgentClient, ClaudeCliClient};
use anyhow::Result;
use cli::{CliArgs, Console, ScenarioArgs};
use config::AppConfig;
use probe::{Probe, ProbeSettings};
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trace::RunTrace;

const LOG_ENV_VAR: &str = "PROMPT_PROBE_LOG";

pub async fn run(args: CliArgs) -> Result<()> {
    let config = apply_overrides(AppConfig::load_with_path(args.config.as_deref())?, &args);
    init_logging(&config.log_level);

    let session_id = generate_session_id();
    let trace = match args.transcript.as_deref() {
        Some(path) => RunTrace::create_at(path)?,
        None => RunTrace::create(args.scenario.name(), &session_id)?,
    };
    info!(
        scenario = args.scenario.name(),
        session_id = %session_id,
        config = %config.config_path.display(),
        transcript = %trace.file_path().display(),
        "starting probe"
    );
    trace.log_info(&format!(
        "scenario {} with agent CLI {}",
        args.scenario.name(),
        config.claude_binary.display()
    ));

    let client = ClaudeCliClient::new(config.claude_binary.clone());
    let mut probe = Probe::new(
        client,
        Console::stdout(),
        trace.clone(),
        ProbeSettings::from_config(&config),
    );

    run_and_report(&mut probe, &trace, &args.scenario).await
}

/// Runs `scenario` and reports a failure once, to both the log and the
/// transcript.
async fn run_and_report<C, W>(
    probe: &mut Probe<C, W>,
    trace: &RunTrace,
    scenario: &ScenarioArgs,
) -> Result<()>
where
    C: AgentClient,
    W: Write + Send,
{
    let result = run_scenario(probe, scenario).await;
    if let Err(err) = &result {
        error!("{} failed: {err:#}", scenario.name());
        trace.log_error(&format!("{err:#}"));
    }
    result
}

async fn run_scenario<C, W>(probe: &mut Probe<C, W>, scenario: &ScenarioArgs) -> Result<()>
where
    C: AgentClient,
    W: Write + Send,
{
    match scenario {
        ScenarioArgs::LoadingOrder { sources } => probe.loading_order(sources).await.map(drop),
        ScenarioArgs::Ask { output, sources } => probe.ask(sources, output).await.map(drop),
        ScenarioArgs::Verify { prompt_file } => probe.verify(prompt_file.as_deref()).await,
        ScenarioArgs::Combined { prompt_file } => probe.combined(prompt_file.as_deref()).await,
        ScenarioArgs::Append { prompt_file } => probe.append(prompt_file.as_deref()).await,
        ScenarioArgs::Design { task } => probe.design(task.as_deref()).await.map(drop),
    }
}

fn apply_overrides(mut config: AppConfig, args: &CliArgs) -> AppConfig {
    if let Some(binary) = &args.claude_bin {
        config.claude_binary = binary.clone();
    }
    if let Some(repo) = &args.prompt_repo {
        config.prompt_repo = repo.clone();
    }
    if args.max_turns.is_some() {
        config.max_turns = args.max_turns;
    }
    config
}

fn init_logging(fallback_level: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback_level));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}

#[cfg(test)]
mod tests {
    use super::{apply_overrides, generate_session_id, run_and_report, run_scenario};
    use crate::access::AccessPatterns;
    use crate::agent::AgentError;
    use crate::agent::testing::{ScriptedClient, assistant, finished};
    use crate::cli::{CliArgs, Console, ScenarioArgs};
    use crate::config::AppConfig;
    use crate::probe::{Probe, ProbeSettings};
    use crate::trace::RunTrace;
    use clap::Parser;
    use std::fs;
    use std::path::{Path, PathBuf};

    #[test]
    fn generated_session_id_has_expected_shape() {
        let session_id = generate_session_id();
        let mut parts = session_id.split('-');
        let ts = parts.next().expect("timestamp segment");
        let pid = parts.next().expect("pid segment");
        assert!(
            parts.next().is_none(),
            "session id should contain one delimiter"
        );
        assert!(
            ts.chars().all(|ch| ch.is_ascii_hexdigit()) && !ts.is_empty(),
            "timestamp segment should be hex"
        );
        assert!(
            pid.chars().all(|ch| ch.is_ascii_hexdigit()) && !pid.is_empty(),
            "pid segment should be hex"
        );
    }

    #[test]
    fn cli_flags_override_config_values() {
        let args = CliArgs::try_parse_from([
            "prompt-probe",
            "--claude-bin",
            "/opt/agent/claude",
            "--prompt-repo",
            "/srv/prompts",
            "--max-turns",
            "7",
            "design",
        ])
        .expect("parse");
        let config = apply_overrides(AppConfig::default(), &args);
        assert_eq!(config.claude_binary, PathBuf::from("/opt/agent/claude"));
        assert_eq!(config.prompt_repo, PathBuf::from("/srv/prompts"));
        assert_eq!(config.max_turns, Some(7));
    }

    #[test]
    fn config_values_survive_without_flags() {
        let args = CliArgs::try_parse_from(["prompt-probe", "verify"]).expect("parse");
        let config = apply_overrides(AppConfig::default(), &args);
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn run_scenario_dispatches_ask_to_the_output_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let output = tmp.path().join("answer.txt");
        let client =
            ScriptedClient::replying(vec![Ok(vec![assistant("loaded CLAUDE.md"), finished()])]);
        let settings = ProbeSettings {
            working_dir: Some(tmp.path().to_path_buf()),
            home_dir: None,
            prompt_repo: tmp.path().join("prompts"),
            model: None,
            max_turns: None,
            trace_patterns: AccessPatterns::default(),
        };
        let trace = RunTrace::create_at(&tmp.path().join("run.log")).expect("trace");
        let mut probe = Probe::new(client, Console::new(Vec::new()), trace, settings);

        let scenario = ScenarioArgs::Ask {
            output: output.clone(),
            sources: vec![crate::agent::SettingSource::Project],
        };
        run_scenario(&mut probe, &scenario).await.expect("ask runs");
        assert_eq!(
            fs::read_to_string(Path::new(&output)).expect("answer"),
            "loaded CLAUDE.md"
        );
    }

    #[tokio::test]
    async fn scenario_failure_is_reported_once() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("CLAUDE.md"), "# Rules\n").expect("write CLAUDE.md");
        let client = ScriptedClient::replying(vec![Err(AgentError::CliNotFound {
            binary: "claude".to_string(),
        })]);
        let settings = ProbeSettings {
            working_dir: Some(tmp.path().to_path_buf()),
            home_dir: None,
            prompt_repo: tmp.path().join("prompts"),
            model: None,
            max_turns: None,
            trace_patterns: AccessPatterns::default(),
        };
        let transcript = tmp.path().join("run.log");
        let trace = RunTrace::create_at(&transcript).expect("trace");
        let mut probe = Probe::new(client, Console::new(Vec::new()), trace.clone(), settings);

        let scenario = ScenarioArgs::LoadingOrder {
            sources: vec![crate::agent::SettingSource::Project],
        };
        run_and_report(&mut probe, &trace, &scenario)
            .await
            .expect_err("missing agent fails");

        let text = fs::read_to_string(&transcript).expect("transcript");
        let errors: Vec<&str> = text
            .lines()
            .filter(|line| line.contains("[error      ]"))
            .collect();
        assert_eq!(errors.len(), 1, "transcript: {text}");
        assert!(errors[0].contains("agent CLI 'claude' not found"));
        assert!(text.contains("[file.read  ] #0 "));
    }
}
