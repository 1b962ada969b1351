use anyhow::Context;
use clap::Parser;
use sounder::cli::{self, Args};
use sounder::output;
use sounder::scan::{run_scan, ScanConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise the -v flags pick the level.
    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sounder={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ports = cli::parse_ports(&args.ports)?;
    let target = cli::resolve_target(&args.target).await?;

    let config = ScanConfig {
        target,
        target_hostname: args.target,
        protocol: args.protocol,
        ports,
        workers: args.workers,
        max_rate: args.rate,
        show_progress: !args.no_progress && !args.json,
    };

    let report = run_scan(config).await?;

    if args.json {
        output::print_json(&report).context("failed to write JSON report")?;
    } else {
        output::print_plain(&report).context("failed to write report")?;
    }

    Ok(())
}
