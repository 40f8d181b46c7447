use clap::Parser;
use codeagent_cli::commands::{cleanup, cli};
use codeagent_cli::{app, logging};
use codeagent_core::api as core_api;
use core_api::CliError;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    let exit = match real_main(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e}");
            core_api::EXIT_GENERAL_ERROR
        }
    };

    // Negative codes (not-run) are not valid process exit statuses.
    std::process::exit(if exit < 0 { 1 } else { exit });
}

async fn real_main(args: cli::Args) -> Result<i32, CliError> {
    let cfg = core_api::load_default()?;

    if matches!(args.command, Some(cli::Commands::Cleanup)) {
        let mut stats = cleanup::CleanupStats::default();
        for dir in logging::sweep_dirs(&cfg.logging) {
            stats.merge(cleanup::cleanup_logs(&dir, cleanup::process_alive)?);
        }
        cleanup::print_stats(&stats);
        return Ok(0);
    }

    let session = logging::init_tracing(&cfg.logging).map_err(CliError::Command)?;
    if let Some(path) = session.path() {
        tracing::info!(log = %path.display(), pid = std::process::id(), "codeagent started");
    }
    for dir in logging::sweep_dirs(&cfg.logging) {
        if let Err(e) = cleanup::cleanup_logs(&dir, cleanup::process_alive) {
            tracing::warn!(dir = %dir.display(), error = %e, "stale log cleanup failed");
        }
    }

    let exit = match app::run_app(args, cfg).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("ERROR: {e}");
            core_api::EXIT_GENERAL_ERROR
        }
    };
    session.finish(exit);
    Ok(exit)
}
