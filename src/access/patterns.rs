pub const DEFAULT_INTERESTING_PATTERNS: [&str; 7] = [
    "claude.md",
    ".claude",
    ".md",
    "system",
    "prompt",
    "instruction",
    "settings",
];

pub const DEFAULT_EXCLUDED_PATTERNS: [&str; 5] = [
    "site-packages",
    "node_modules",
    "__pycache__",
    "/target/",
    "/.git/",
];

/// Substring lists deciding which opened paths are worth recording.
///
/// Patterns are stored case-folded and matched against the case-folded path
/// with `\` normalized to `/`, so one pattern list works on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPatterns {
    interesting: Vec<String>,
    excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClassification {
    pub path: String,
    pub matched_patterns: Vec<String>,
    pub excluded: bool,
}

impl AccessClassification {
    pub fn should_record(&self) -> bool {
        !self.matched_patterns.is_empty() && !self.excluded
    }
}

impl Default for AccessPatterns {
    fn default() -> Self {
        Self::new(DEFAULT_INTERESTING_PATTERNS, DEFAULT_EXCLUDED_PATTERNS)
    }
}

impl AccessPatterns {
    pub fn new<I, E>(interesting: I, excluded: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            interesting: fold_all(interesting),
            excluded: fold_all(excluded),
        }
    }

    pub fn interesting(&self) -> &[String] {
        &self.interesting
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn classify(&self, path: &str) -> AccessClassification {
        let folded = fold(path);
        let matched_patterns = self
            .interesting
            .iter()
            .filter(|pattern| folded.contains(pattern.as_str()))
            .cloned()
            .collect();
        // Rooted so `/target/` also excludes a relative `target/...`.
        let rooted = format!("/{folded}");
        let excluded = self
            .excluded
            .iter()
            .any(|pattern| rooted.contains(pattern.as_str()));

        AccessClassification {
            path: path.to_string(),
            matched_patterns,
            excluded,
        }
    }
}

fn fold(value: &str) -> String {
    value.replace('\\', "/").to_lowercase()
}

fn fold_all<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| fold(value.as_ref()))
        .filter(|value| !value.trim().is_empty())
        .collect()
}
