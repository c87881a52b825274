//! spm -- command-line interface for the priority mapping rule engine.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use spm_core::config::SpmConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// CLI 기본 로그 레벨 (`--log-level`로 변경)
const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // config 명령은 설정 파일 자체를 검사하므로 기본값으로 로깅을 시작합니다.
    let config = match cli.command {
        Commands::Config(_) => SpmConfig::default(),
        _ => commands::load_config(&cli.config).await?,
    };

    let mut general = config.general.clone();
    general.log_level = cli
        .log_level
        .unwrap_or_else(|| DEFAULT_CLI_LOG_LEVEL.to_owned());
    logging::init_tracing(&general)?;
    spm_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "spm starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Rules(args) => commands::rules::execute(args, &config, &writer).await,
        Commands::Classify(args) => commands::classify::execute(args, &config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
