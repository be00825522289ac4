use std::io::{self, Write};

const RULE_WIDTH: usize = 80;

/// Human-facing output of a probe run. Diagnostics go through `tracing`;
/// this is what the user reads on stdout.
pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, title: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        self.write(&format!("\n{rule}\n{title}\n{rule}\n"));
    }

    pub fn section(&mut self, title: &str, lines: &[&str]) {
        let rule = "=".repeat(RULE_WIDTH);
        let mut text = format!("\n{rule}\n{title}\n");
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&rule);
        text.push('\n');
        self.write(&text);
    }

    pub fn text(&mut self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    fn write(&mut self, text: &str) {
        // Losing stdout (closed pipe) must not abort a probe mid-stream.
        if self.out.write_all(text.as_bytes()).is_err() || self.out.flush().is_err() {
            tracing::debug!("console output dropped");
        }
    }
}
