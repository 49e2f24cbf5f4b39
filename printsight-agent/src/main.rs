use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::time::{MissedTickBehavior, interval};

use printsight_agent::{
    AgentConfig, AgentFileConfig, Aggregator, Reporter, Scheduler, SnmpTransport,
};
use printsight_common::init_tracing;

/// SNMP printer status agent.
#[derive(Parser, Debug)]
#[command(name = "printsight-agent")]
#[command(about = "Poll printers over SNMP and report their status", long_about = None)]
struct Args {
    /// Path to the configuration file (JSON5 format).
    #[arg(short, long, default_value = "printsight.json5")]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Poll every device once and exit, ignoring the configured interval.
    #[arg(long)]
    once: bool,

    /// Additional device address (repeatable).
    #[arg(short, long = "device")]
    device: Vec<String>,
}

/// Shared state of every poll job.
struct Agent {
    aggregator: Aggregator,
    transport: SnmpTransport,
    reporter: Reporter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Devices given on the command line are enough to run without a file.
    let mut config = if args.config.exists() || args.device.is_empty() {
        AgentFileConfig::load(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        AgentFileConfig {
            logging: Default::default(),
            report: Default::default(),
            agent: AgentConfig::default(),
        }
    };
    config.agent.devices.extend(args.device.iter().cloned());
    config.validate().context("Invalid configuration")?;

    let logging = config.logging.with_level_override(args.log_level.as_deref());
    init_tracing(&logging).context("Failed to initialize tracing")?;

    let devices = config.agent.device_addresses();
    let poll_interval_secs = if args.once {
        0
    } else {
        config.agent.poll_interval_secs
    };

    tracing::info!(
        config = ?args.config,
        devices = devices.len(),
        workers = config.agent.workers,
        interval_secs = poll_interval_secs,
        "Starting printsight-agent"
    );

    let agent = Arc::new(Agent {
        aggregator: Aggregator::new(config.agent.poll_settings()),
        transport: SnmpTransport::new(),
        reporter: Reporter::stdout(config.report.format),
    });
    let scheduler = Scheduler::new(config.agent.workers);

    if poll_interval_secs == 0 {
        run_pass(&scheduler, &agent, &devices).await?;
    } else {
        let mut ticker = interval(Duration::from_secs(poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_pass(&scheduler, &agent, &devices).await?,
                _ = signal::ctrl_c() => {
                    tracing::info!("Shutting down...");
                    break;
                }
            }
        }
    }

    scheduler.shutdown().await;
    tracing::info!("Goodbye!");

    Ok(())
}

/// Submit one poll job per device and wait for all of them.
async fn run_pass(scheduler: &Scheduler, agent: &Arc<Agent>, devices: &[String]) -> Result<()> {
    for host in devices {
        let agent = agent.clone();
        let host = host.clone();

        scheduler
            .submit(async move {
                let written = match agent.aggregator.poll(&agent.transport, &host).await {
                    Ok(status) => agent.reporter.report(&status),
                    Err(e) => agent.reporter.report_error(&host, &e),
                };
                if let Err(e) = written {
                    tracing::error!(device = %host, error = %e, "Failed to write report");
                }
            })
            .await
            .context("Failed to submit poll job")?;
    }

    scheduler.wait().await;

    let summary = agent.reporter.take_summary();
    tracing::info!(
        polled = summary.polled,
        failed = summary.failed,
        "Polling pass complete"
    );

    Ok(())
}
