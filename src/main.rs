use std::process::ExitCode;

use clap::Parser;
use stylecard::{
    cli::{AppContext, Cli, Commands},
    infra::IngestError,
};
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter (e.g. `STYLECARD_LOG=stylecard=debug`)
const LOG_ENV: &str = "STYLECARD_LOG";

fn init_tracing(no_color: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so stdout stays clean for text/JSON reports
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.no_color);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    let result = match cli.command {
        Commands::Analyze(args) => stylecard::analyze_run(args, &ctx),
        Commands::Init(args) => stylecard::infra::config::init(args, &ctx),
        Commands::Completions(args) => stylecard::completion::run(args, &ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Ingestion failures carry help text; render them with miette
            match err.downcast::<IngestError>() {
                Ok(diag) => eprintln!("{:?}", miette::Report::new(diag)),
                Err(err) => eprintln!("Error: {err:?}"),
            }
            ExitCode::FAILURE
        }
    }
}
