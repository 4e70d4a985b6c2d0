//! loanrisk - Main Entry Point

use clap::Parser;
use loanrisk::cli::{cmd_predict, cmd_serve, cmd_summary, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loanrisk=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, test_size, seed } => {
            cmd_train(&cli.artifacts, &data, test_size, seed)?;
        }
        Commands::Predict { model, threshold, set } => {
            cmd_predict(&cli.artifacts, &model, threshold, &set)?;
        }
        Commands::Summary => {
            cmd_summary(&cli.artifacts)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(&cli.artifacts, &host, port).await?;
        }
    }

    Ok(())
}
