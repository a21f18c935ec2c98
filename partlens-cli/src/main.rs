// ABOUTME: Main entry point for the partlens CLI application
// ABOUTME: Parses arguments, sets up logging and reports failures with help text

use clap::Parser;
use partlens_cli::cli::Cli;
use partlens_cli::cli_output::CliOutput;
use partlens_cli::commands;
use std::env;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let use_color = !cli.no_color && env::var("NO_COLOR").is_err();
    let output = if use_color {
        CliOutput::new()
    } else {
        CliOutput::with_color(false)
    };

    if let Err(err) = commands::run(cli, &output).await {
        log::debug!("Command failed: {:?}", err);
        output.failure(&err);
        std::process::exit(1);
    }
}
