//! CLI argument definitions for the ctmon daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use ctmon_core::config::{CtmonConfig, RejectedOverride};

/// Per-source traffic accounting from conntrack DESTROY events.
///
/// Spawns the conntrack event source, aggregates bytes and packets of
/// web flows by original source address, and appends a ranked report
/// to the output file at every minute boundary.
#[derive(Parser, Debug, Default)]
#[command(name = "ctmon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Report output file (`-` for stdout). Overrides `[report] output`.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to a ctmon.toml configuration file.
    ///
    /// Without this flag, built-in defaults plus `CTMON_*` environment
    /// variables are used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Build the effective configuration: file (or defaults), environment,
    /// then CLI flags, validated once at the end.
    ///
    /// Environment values that failed to parse are returned rather than
    /// logged, since the tracing subscriber depends on this configuration.
    pub async fn load_config(&self) -> Result<(CtmonConfig, Vec<RejectedOverride>)> {
        let mut config = match &self.config {
            Some(path) => CtmonConfig::from_file(path)
                .await
                .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
            None => CtmonConfig::default(),
        };
        let rejected = config.apply_env_overrides();
        self.apply_overrides(&mut config);
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        Ok((config, rejected))
    }

    /// Apply CLI overrides on top of a loaded configuration.
    ///
    /// CLI flags have the highest precedence.
    pub fn apply_overrides(&self, config: &mut CtmonConfig) {
        if let Some(output) = &self.output {
            config.report.output = output.clone();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}
