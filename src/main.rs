use clap::Parser;
use pdm_agent::utils::{logger, validation::Validate};
use pdm_agent::{Agent, CliConfig, ConfigProvider, CsvStore, MockSource, SensorSource, SerialSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting predictive maintenance agent");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let thresholds = match config.load_thresholds() {
        Ok(thresholds) => thresholds,
        Err(e) => {
            tracing::error!("❌ Failed to load thresholds: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    };

    let store = match CsvStore::new(config.data_dir()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("❌ Cannot prepare data directory: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::info!("✅ Data will be saved under: {}", store.data_dir().display());

    let source: Box<dyn SensorSource> = if config.use_mock() {
        tracing::info!("📊 Using mock sensor data (no hardware attached)");
        Box::new(MockSource::new(config.machine_id()))
    } else {
        tracing::info!("🔌 Connecting to sensor device on {}...", config.port_path());
        match SerialSource::open(config.port_path(), config.baud_rate()).await {
            Ok(serial) => Box::new(serial),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Could not open {}: {}. Falling back to mock data",
                    config.port_path(),
                    e
                );
                Box::new(MockSource::new(config.machine_id()))
            }
        }
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 Resource monitoring enabled");
    }

    let agent = Agent::new_with_monitoring(source, store, thresholds, monitor_enabled);

    match agent.run(shutdown_signal()).await {
        Ok(summary) => {
            tracing::info!(
                "✅ Agent stopped cleanly: {} readings, {} anomalies",
                summary.readings,
                summary.anomalies
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Agent failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                pdm_agent::utils::error::ErrorSeverity::Low => 0,
                pdm_agent::utils::error::ErrorSeverity::Medium => 2,
                pdm_agent::utils::error::ErrorSeverity::High => 1,
                pdm_agent::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM. The container runtime sends SIGTERM on
/// stop, so both paths must drain cleanly.
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
