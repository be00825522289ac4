use anyhow::{Result, anyhow, bail};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;

use crate::access::TracedAccessEvent;

const RUNS_DIR_NAME: &str = "prompt-probe/runs";

/// Per-run transcript: prompts sent, responses received and files read.
#[derive(Clone)]
pub struct RunTrace {
    inner: Arc<TraceInner>,
}

struct TraceInner {
    writer: Mutex<BufWriter<File>>,
    file_path: PathBuf,
    write_failed: AtomicBool,
}

impl RunTrace {
    pub fn create(scenario: &str, session_id: &str) -> Result<Self> {
        let runs_dir = resolve_runs_dir_from_env()?;
        Self::create_in_dir(scenario, session_id, &runs_dir)
    }

    pub fn create_in_dir(scenario: &str, session_id: &str, runs_dir: &Path) -> Result<Self> {
        fs::create_dir_all(runs_dir).map_err(|err| {
            anyhow!(
                "Failed to create transcript directory {}: {err}",
                runs_dir.display()
            )
        })?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs());
        let file_name = format!("{scenario}-{session_id}-{timestamp}.log");
        Self::create_at(&runs_dir.join(file_name))
    }

    pub fn create_at(file_path: &Path) -> Result<Self> {
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                anyhow!(
                    "Failed to create transcript directory {}: {err}",
                    parent.display()
                )
            })?;
        }

        let file = create_trace_file(file_path).map_err(|err| {
            anyhow!(
                "Failed to create transcript file {}: {err}",
                file_path.display()
            )
        })?;

        Ok(Self {
            inner: Arc::new(TraceInner {
                writer: Mutex::new(BufWriter::new(file)),
                file_path: file_path.to_path_buf(),
                write_failed: AtomicBool::new(false),
            }),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.inner.file_path
    }

    pub fn log_info(&self, text: &str) {
        self.log_lines("info", text);
    }

    pub fn log_error(&self, text: &str) {
        self.log_lines("error", text);
    }

    pub fn log_options(&self, text: &str) {
        self.log_single("options", text);
    }

    pub fn log_prompt(&self, text: &str) {
        self.log_lines("prompt", text);
    }

    pub fn log_response(&self, text: &str) {
        self.log_lines("response", text);
    }

    pub fn log_message_kind(&self, kind: &str) {
        self.log_single("message", kind);
    }

    pub fn log_file_read(&self, event: &TracedAccessEvent) {
        self.log_single(
            "file.read",
            &format!("#{} {}", event.sequence_number, event.path),
        );
    }

    fn log_lines(&self, kind: &str, text: &str) {
        if text.is_empty() {
            self.log_single(kind, "<empty>");
            return;
        }

        for line in text.lines() {
            self.log_single(kind, line);
        }
    }

    fn log_single(&self, kind: &str, text: &str) {
        let timestamp = current_timestamp();
        self.write_raw(&format!("[{timestamp}] [{:<11}] {text}\n", kind));
    }

    fn write_raw(&self, text: &str) {
        let Ok(mut writer) = self.inner.writer.lock() else {
            self.report_write_failure("failed to acquire transcript writer lock");
            return;
        };

        if writer.write_all(text.as_bytes()).is_err() || writer.flush().is_err() {
            self.report_write_failure("failed to write to transcript file");
        }
    }

    fn report_write_failure(&self, message: &str) {
        if !self.inner.write_failed.swap(true, Ordering::Relaxed) {
            tracing::warn!("prompt-probe transcript warning: {message}");
        }
    }
}

#[cfg(unix)]
fn create_trace_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_trace_file(path: &Path) -> std::io::Result<File> {
    File::create(path)
}

fn current_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.millisecond()
    )
}

pub fn resolve_runs_dir_from_env() -> Result<PathBuf> {
    let xdg_state = env::var("XDG_STATE_HOME").ok();
    let home = dirs::home_dir();
    resolve_runs_dir(xdg_state.as_deref(), home.as_deref())
}

fn resolve_runs_dir(xdg_state_home: Option<&str>, home_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_state_home {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve transcript path: XDG_STATE_HOME is set but empty");
        }
        return Ok(PathBuf::from(trimmed).join(RUNS_DIR_NAME));
    }

    let home = home_dir.ok_or_else(|| {
        anyhow!("Failed to resolve transcript path: HOME directory is unavailable")
    })?;
    Ok(home.join(".local/state").join(RUNS_DIR_NAME))
}
