//! Conntrack event source process.
//!
//! Spawns the configured event command (by default
//! `conntrack -E -e DESTROY -p tcp`) and exposes its stdout as a
//! buffered line stream. The child is killed when the handle is dropped.

use std::process::{ExitStatus, Stdio};

use anyhow::Result;
use ctmon_core::config::SourceConfig;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};

/// A running event source process.
pub struct ConntrackSource {
    child: Child,
}

impl ConntrackSource {
    /// Spawn the event command with stdout piped.
    ///
    /// Returns the process handle and its stdout stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started.
    pub fn spawn(config: &SourceConfig) -> Result<(Self, BufReader<ChildStdout>)> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                anyhow::anyhow!("failed to spawn event source '{}': {}", config.command, e)
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("event source stdout was not captured"))?;

        tracing::info!(
            command = %config.command,
            args = ?config.args,
            pid = child.id(),
            "event source started"
        );

        Ok((Self { child }, BufReader::new(stdout)))
    }

    /// Stop the process if still running and collect its exit status.
    pub async fn shutdown(mut self) -> Result<ExitStatus> {
        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::info!(status = %status, "event source already exited");
            return Ok(status);
        }

        if let Err(e) = self.child.start_kill() {
            tracing::warn!(error = %e, "failed to signal event source");
        }
        let status = self.child.wait().await?;
        tracing::info!(status = %status, "event source stopped");
        Ok(status)
    }
}
