//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use indicatif::MultiProgress;

use ytdlm_cli::{Cli, CliConfig, Commands, bootstrap, handlers, logging};

/// Exit status after Ctrl+C, following the shell convention for SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let progress = MultiProgress::new();
    logging::init(cli.verbose, progress.clone());

    match run(cli, &progress).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, progress: &MultiProgress) -> anyhow::Result<ExitCode> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let ctx = bootstrap(CliConfig::default().with_config_path(cli.config))?;

    match command {
        Commands::Download(args) => {
            let summary = handlers::download::execute(&ctx, &args, progress).await?;
            if summary.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
            if summary.cancelled > 0 {
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
        }
        Commands::Info { url, json } => handlers::info::execute(&ctx, &url, json).await?,
        Commands::Playlist { url } => handlers::playlist::execute(&ctx, &url).await?,
        Commands::Version => handlers::version::execute(&ctx).await?,
        Commands::Config { command } => handlers::config::execute(&ctx, &command)?,
    }

    Ok(ExitCode::SUCCESS)
}
