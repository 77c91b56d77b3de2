//! Prometheus metrics HTTP listener.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`.
//! Disabled by default; enabled through `[metrics] enabled = true`.

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use ctmon_core::config::MetricsConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Resolve the listen socket address from configuration.
pub fn listen_socket(config: &MetricsConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Install the global metrics recorder and start the HTTP listener.
///
/// Must be called at most once per process, from within a tokio runtime.
///
/// # Errors
///
/// - The listen address is not an IP address
/// - Socket binding fails
/// - A global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = listen_socket(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen_addr in untrusted networks"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    ctmon_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(())
}
