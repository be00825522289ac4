mod args;
mod console;

pub use args::{CliArgs, DEFAULT_RESPONSE_FILE, ScenarioArgs};
pub use console::Console;
