use anyhow::Result;
use clap::Parser;
use prompt_probe::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    prompt_probe::run(args).await
}
