/*!
 * btkvm
 * Move bluetooth keyboard, mouse and trackpad between two Macs via blueutil
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};

mod bluetooth;
mod config;
mod workflow;

use bluetooth::{CommandRunner, Operation, ProcessRunner};
use config::SwapConfig;
use workflow::{Sequencer, Workflow};

#[derive(Parser)]
#[command(name = "btkvm")]
#[command(about = "Swap bluetooth peripherals between two hosts")]
struct Cli {
    /// attach, detach, or anything else for a connection report
    workflow: Option<String>,

    /// Configuration file path (built-in device table when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single operation on every device instead of a workflow
    #[arg(short, long, value_name = "OPERATION", conflicts_with = "workflow")]
    op: Option<Operation>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("btkvm={}", log_level))
        .with_writer(io::stdout)
        .with_ansi(false)
        .init();

    // Failures are reported, never turned into an exit status
    if let Err(e) = run(cli, ProcessRunner, &mut io::stdout()).await {
        error!("{:#}", e);
    }
}

async fn run<R: CommandRunner>(cli: Cli, runner: R, out: &mut impl Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SwapConfig::load(path)
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => SwapConfig::default()
            .validated()
            .context("Built-in device table is invalid")?,
    };

    let sequencer = Sequencer::new(&config, runner);

    if let Some(operation) = cli.op {
        return run_operation(&sequencer, operation, out).await;
    }

    let workflow = Workflow::from_arg(cli.workflow.as_deref());
    info!("Running {:?} for {} devices", workflow, config.devices.len());

    let table = sequencer.run(workflow).await;
    info!("{} of {} devices connected", table.connected_count(), table.devices.len());
    write!(out, "{}", table)?;

    Ok(())
}

async fn run_operation<R: CommandRunner>(
    sequencer: &Sequencer<R>,
    operation: Operation,
    out: &mut impl Write,
) -> Result<()> {
    let results = sequencer.run_single(operation).await;

    for device in sequencer.operator().devices() {
        match results.get(&device.address) {
            Some(output) => {
                writeln!(out, "{} ({}):", device.name, device.address)?;
                for line in output.stdout.lines().chain(output.stderr.lines()) {
                    writeln!(out, "  {}", line)?;
                }
            }
            None => writeln!(out, "{} ({}): failed", device.name, device.address)?,
        }
    }

    Ok(())
}
