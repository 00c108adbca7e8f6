use anyhow::Result;
use clap::Parser;
use log2sentry::cli::{package_version, run, Cli};

fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Usage errors exit here, before any file I/O.
    let cli = Cli::parse();
    log2sentry::logging::init(cli.log_format);
    tracing::info!("CLI arguments parsed, invoking run");

    let report = run(cli, &package_version())?;
    println!(
        "Prepared {} unit(s) from {} file(s); {} failed, {} skipped.",
        report.unit_count(),
        report.prepared.len(),
        report.failed.len(),
        report.skipped.len()
    );
    Ok(())
}
