//! Files the agent may read as prompt sources for a set of setting sources.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::access::ResourceOpener;
use crate::agent::SettingSource;

const FIRST_LINE_MAX_CHARS: usize = 120;

const USER_FILES: [&str; 2] = [".claude/CLAUDE.md", ".claude/settings.json"];
const PROJECT_FILES: [&str; 5] = [
    "CLAUDE.md",
    ".claude/CLAUDE.md",
    ".claude/settings.json",
    ".claude/system.md",
    ".claude/instructions.md",
];
const LOCAL_FILES: [&str; 2] = ["CLAUDE.local.md", ".claude/settings.local.json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSourceFile {
    pub source: SettingSource,
    pub path: PathBuf,
    pub bytes: usize,
    pub first_line: Option<String>,
}

/// Candidate paths in precedence order: user, then project, then local.
/// Sources that were not requested are left out; user files need a home
/// directory.
pub fn candidate_paths(
    project_root: &Path,
    home: Option<&Path>,
    sources: &[SettingSource],
) -> Vec<(SettingSource, PathBuf)> {
    let mut candidates = Vec::new();

    if sources.contains(&SettingSource::User)
        && let Some(home) = home
    {
        candidates.extend(
            USER_FILES
                .iter()
                .map(|name| (SettingSource::User, home.join(name))),
        );
    }
    if sources.contains(&SettingSource::Project) {
        candidates.extend(
            PROJECT_FILES
                .iter()
                .map(|name| (SettingSource::Project, project_root.join(name))),
        );
    }
    if sources.contains(&SettingSource::Local) {
        candidates.extend(
            LOCAL_FILES
                .iter()
                .map(|name| (SettingSource::Local, project_root.join(name))),
        );
    }

    candidates
}

/// Reads every candidate through `opener`, skipping the ones that do not
/// exist.
pub fn scan<O>(opener: &O, candidates: &[(SettingSource, PathBuf)]) -> Result<Vec<PromptSourceFile>>
where
    O: ResourceOpener,
    O::Handle: Read,
{
    let mut found = Vec::new();
    for (source, path) in candidates {
        let content = match opener.read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(anyhow!(
                    "Failed to read prompt source {}: {err}",
                    path.display()
                ));
            }
        };

        found.push(PromptSourceFile {
            source: *source,
            path: path.clone(),
            bytes: content.len(),
            first_line: first_line(&content),
        });
    }
    Ok(found)
}

fn first_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(FIRST_LINE_MAX_CHARS).collect())
}
