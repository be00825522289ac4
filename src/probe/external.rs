use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::access::ResourceOpener;
use crate::agent::{AgentOptions, PermissionMode, SystemPromptSource};

pub const DESIGN_PROMPT_FILE: &str = "Design.md";

pub fn default_prompt_file(prompt_repo: &Path) -> PathBuf {
    prompt_repo.join(DESIGN_PROMPT_FILE)
}

/// Reads an external prompt file. `Ok(None)` means the file does not exist.
pub fn read_prompt<O>(opener: &O, path: &Path) -> Result<Option<String>>
where
    O: ResourceOpener,
    O::Handle: Read,
{
    match opener.read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow!(
            "Failed to read prompt file {}: {err}",
            path.display()
        )),
    }
}

/// Like [`read_prompt`], but a missing file is an error.
pub fn load_prompt_file<O>(opener: &O, path: &Path) -> Result<String>
where
    O: ResourceOpener,
    O::Handle: Read,
{
    read_prompt(opener, path)?.ok_or_else(|| {
        anyhow!(
            "Prompt file not found: {}; ensure {} exists",
            path.display(),
            path.display()
        )
    })
}

/// An agent whose whole system prompt comes from `Design.md` in the prompt
/// repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignAgent {
    prompt_path: PathBuf,
    system_prompt: String,
}

impl DesignAgent {
    pub const ALLOWED_TOOLS: [&'static str; 3] = ["Read", "Glob", "Grep"];

    pub fn load<O>(opener: &O, prompt_repo: &Path) -> Result<Self>
    where
        O: ResourceOpener,
        O::Handle: Read,
    {
        let prompt_path = default_prompt_file(prompt_repo);
        let system_prompt = read_prompt(opener, &prompt_path)?.ok_or_else(|| {
            anyhow!("Design prompt not found at: {}", prompt_path.display())
        })?;
        Ok(Self {
            prompt_path,
            system_prompt,
        })
    }

    pub fn prompt_path(&self) -> &Path {
        &self.prompt_path
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Layers the design prompt, tools and permission mode onto `base`.
    pub fn options(&self, base: AgentOptions) -> AgentOptions {
        base.with_system_prompt(SystemPromptSource::Literal(self.system_prompt.clone()))
            .with_allowed_tools(&Self::ALLOWED_TOOLS)
            .with_permission_mode(PermissionMode::AcceptEdits)
    }
}
