use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use forza_launcher::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the status line / JSON report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    match cli::run(args).await {
        Ok(outcome) if outcome.is_success() => Ok(()),
        Ok(_) => {
            // Non-success terminal status maps to a non-zero exit for scripting.
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}
