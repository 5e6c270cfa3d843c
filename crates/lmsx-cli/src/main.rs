use std::process::ExitCode;

use clap::Parser;
use lmsx_export::{Pipeline, SystemProbe, SystemRunner};

mod bootstrap;
mod cli;
mod output;
mod progress;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("lmsx error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = bootstrap::load_config(&cli)?;

    let runner = SystemRunner;
    let probe = SystemProbe::new(&runner, config.sync.aws.clone());
    let show_progress = !cli.quiet && !cli.verbose && cli.format == cli::OutputFormat::Text;
    let progress = progress::StepProgress::new(show_progress);

    let report = Pipeline::new(&config, &runner, &probe, cli.options()).run(&progress)?;
    progress.finish_clear();

    output::output(&report, cli.format)?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Logs go to stderr; stdout carries only the run report.
fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LMSX_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
