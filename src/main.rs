use anyhow::{Context, Result};
use clap::Parser;
use fakelog::{BuiltinCorpus, EmitOptions, OutputFormat, Settings};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Output file
    #[arg(long, default_value = "stdout")]
    output: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Combined)]
    format: OutputFormat,

    /// Stop after this many records [default = run until interrupted]
    #[arg(long)]
    count: Option<u64>,

    /// Stop after this long, e.g. "30s" or "5m" [default = run until interrupted]
    #[arg(long)]
    duration: Option<humantime::Duration>,

    /// Seed for a reproducible record stream
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    /// Stamp records in UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Log diagnostics at debug level
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = cli
        .settings
        .validate()
        .context("Invalid generation settings")?;

    let options = EmitOptions {
        output: cli.output,
        format: cli.format,
        count: cli.count,
        duration: cli.duration.map(|d| d.into()),
        seed: cli.seed,
        utc: cli.utc,
    };

    let summary = fakelog::run(config, BuiltinCorpus, options, shutdown_handler()).await?;

    info!(
        event = "exit",
        records = summary.records,
        message = "Generator stopped"
    );

    Ok(())
}

/// Diagnostics go to stderr so they never mix with records on stdout
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Sets up a Ctrl+C handler that broadcasts a shutdown
fn shutdown_handler() -> broadcast::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(event = "signal_error", error = %e, message = "Failed to listen for Ctrl+C");
            // Keep the sender alive so the generator is not stopped by a closed channel
            std::future::pending::<()>().await;
        }

        info!(event = "interrupt", message = "Received interrupt signal (Ctrl+C)");
        let _ = shutdown_tx.send(());
    });

    shutdown_rx
}
