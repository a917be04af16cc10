use std::time::Duration;

use clap::Parser;
use pdm_agent::utils::monitor::SystemMonitor;
use pdm_agent::utils::{logger, validation};
use pdm_agent::CsvMonitor;

#[derive(Debug, Parser)]
#[command(name = "csv-monitor")]
#[command(about = "Watches a sensor CSV file for changes and records drift metrics")]
struct MonitorCli {
    /// CSV file to watch.
    csv_path: String,

    /// Seconds between checks.
    #[arg(long, default_value = "300")]
    interval_secs: u64,

    #[arg(long, default_value = "./csv_backups")]
    backup_dir: String,

    #[arg(long, default_value = "./metrics")]
    metrics_dir: String,

    /// Row-count delta above which an alert is raised.
    #[arg(long, default_value = "1000")]
    row_alert_threshold: u64,

    /// Emit JSON logs (for collectors) instead of the compact format.
    #[arg(long)]
    json: bool,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = MonitorCli::parse();

    if cli.json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = validate(&cli) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let mut monitor = match CsvMonitor::new(
        &cli.csv_path,
        &cli.backup_dir,
        &cli.metrics_dir,
        cli.row_alert_threshold,
    ) {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!("❌ Cannot start monitor: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let system = SystemMonitor::new(true);
    let interval = Duration::from_secs(cli.interval_secs);
    tracing::info!(
        "Watching {} every {}s",
        monitor.csv_path().display(),
        cli.interval_secs
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Monitoring stopped");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                run_check(&mut monitor, &system);
                tracing::info!("Next check in {}s", cli.interval_secs);
            }
        }
    }

    Ok(())
}

fn run_check(monitor: &mut CsvMonitor, system: &SystemMonitor) {
    match monitor.check_once() {
        Ok(Some(mut metrics)) => {
            metrics.process = system.get_stats();

            if monitor.should_alert(&metrics) {
                tracing::error!(
                    "🚨 Significant CSV change: {} rows changed in {}",
                    metrics.rows_changed,
                    monitor.csv_path().display()
                );
            }

            if let Err(e) = monitor.save_metrics(&metrics) {
                tracing::error!("Failed to save metrics: {}", e);
            }
        }
        Ok(None) => tracing::debug!("No changes detected"),
        Err(e) => tracing::error!("Check failed: {}", e),
    }
}

fn validate(cli: &MonitorCli) -> pdm_agent::Result<()> {
    validation::validate_path("csv_path", &cli.csv_path)?;
    validation::validate_path("backup_dir", &cli.backup_dir)?;
    validation::validate_path("metrics_dir", &cli.metrics_dir)?;
    validation::validate_positive_number("interval_secs", cli.interval_secs, 1)?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
