//! Daemon supervision -- source process, report sink, signals, lifecycle.
//!
//! The [`Supervisor`] owns the validated configuration and the shared
//! accounting window. [`Supervisor::run`] wires the pieces together:
//!
//! 1. Readiness check of the conntrack accounting sysctl (warn only)
//! 2. Open the report sink
//! 3. Spawn the event source process
//! 4. Ingest events until the stream ends or a shutdown signal arrives
//! 5. Stop the event source
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: final report, then clean exit
//! - `SIGUSR1`: log the current window without resetting it

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ctmon_accounting::report;
use ctmon_accounting::{AccountingError, AccountingStore, FlowIngestorBuilder, IngestStats};
use ctmon_core::config::CtmonConfig;

use crate::metrics_server;
use crate::readiness;
use crate::sink;
use crate::source::ConntrackSource;

/// Runs one accounting session for the lifetime of the event source.
pub struct Supervisor {
    /// Loaded and validated configuration.
    config: CtmonConfig,
    /// Accounting window shared with the diagnostic dump task.
    store: Arc<AccountingStore>,
}

impl Supervisor {
    /// Load configuration from `config_path` and build the supervisor.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = CtmonConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Installs the Prometheus recorder when `[metrics]` is enabled.
    pub fn build_from_config(config: CtmonConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        Ok(Self {
            config,
            store: Arc::new(AccountingStore::new()),
        })
    }

    /// Run until the event stream ends or a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error when the event source terminates on its own,
    /// which the binary turns into a non-zero exit status.
    pub async fn run(&mut self) -> Result<IngestStats> {
        let cancel = CancellationToken::new();
        let signals = spawn_signal_listener(cancel.clone(), Arc::clone(&self.store))?;

        let result = self.run_until(cancel.clone()).await;

        cancel.cancel();
        let _ = signals.await;
        result
    }

    /// Run until the event stream ends or `cancel` fires.
    pub async fn run_until(&mut self, cancel: CancellationToken) -> Result<IngestStats> {
        readiness::check_conntrack_accounting(Path::new(&self.config.source.acct_sysctl_path))
            .await;

        let mut sink = sink::open_report_sink(&self.config.report.output).await?;
        let (source, reader) = ConntrackSource::spawn(&self.config.source)?;

        let mut ingestor = FlowIngestorBuilder::new()
            .config(&self.config)
            .store(Arc::clone(&self.store))
            .build();

        let result = ingestor.run(reader, &mut sink, &cancel).await;

        if let Err(e) = source.shutdown().await {
            tracing::warn!(error = %e, "failed to reap event source");
        }

        match result {
            Ok(stats) => {
                tracing::info!(
                    lines = stats.lines,
                    accepted = stats.accepted,
                    rejected = stats.rejected,
                    malformed = stats.malformed,
                    rollovers = stats.rollovers,
                    sink_failures = stats.sink_failures,
                    "ingestion stopped"
                );
                Ok(stats)
            }
            Err(AccountingError::StreamTerminated) => {
                tracing::error!("event source terminated unexpectedly");
                Err(anyhow::anyhow!("event source terminated"))
            }
            Err(e) => {
                tracing::error!(error = %e, "ingestion failed");
                Err(anyhow::anyhow!("ingestion failed: {}", e))
            }
        }
    }

    /// Shared accounting window.
    pub fn store(&self) -> &Arc<AccountingStore> {
        &self.store
    }

    /// Loaded configuration.
    pub fn config(&self) -> &CtmonConfig {
        &self.config
    }
}

/// Render the current window without resetting it.
///
/// Returns the number of sources and the report text.
pub fn dump_window(store: &AccountingStore, at: NaiveDateTime) -> (usize, String) {
    let mut entries = store.snapshot();
    let count = entries.len();
    (count, report::render(&mut entries, at))
}

/// Listen for shutdown and diagnostic signals until `cancel` fires.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
fn spawn_signal_listener(
    cancel: CancellationToken,
    store: Arc<AccountingStore>,
) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
    let mut sigusr1 = signal(SignalKind::user_defined1())
        .map_err(|e| anyhow::anyhow!("failed to install SIGUSR1 handler: {}", e))?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
                _ = sigusr1.recv() => {
                    let (sources, text) = dump_window(&store, Local::now().naive_local());
                    tracing::info!(sources, report = %text, "current accounting window");
                    continue;
                }
            };

            tracing::info!(signal = name, "shutdown signal received");
            cancel.cancel();
            break;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ctmon_accounting::EventParser;

    #[test]
    fn dump_window_keeps_entries() {
        let store = AccountingStore::new();
        let flow = EventParser::new()
            .parse("src=10.0.0.1 dst=10.0.0.2 sport=1 dport=443 packets=20 bytes=2000")
            .unwrap();
        store.record(&flow);

        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let (sources, text) = dump_window(&store, at);

        assert_eq!(sources, 1);
        assert!(text.starts_with("Time: 2024-05-01 09:00:00\n"));
        assert!(text.contains("10.0.0.1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = CtmonConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(Supervisor::build_from_config(config).is_err());
    }
}
