//! Report sink selection.
//!
//! Reports are appended to a file, or written to stdout when the
//! output is `-`.

use std::path::Path;

use anyhow::Result;
use tokio::io::AsyncWrite;

/// Output value that selects stdout.
pub const STDOUT_OUTPUT: &str = "-";

/// Boxed report sink.
pub type ReportSink = Box<dyn AsyncWrite + Unpin + Send>;

/// Open the report sink for `output`.
///
/// Files are created if missing and always opened in append mode, so
/// earlier reports survive a restart.
pub async fn open_report_sink(output: &str) -> Result<ReportSink> {
    if output == STDOUT_OUTPUT {
        tracing::info!("writing reports to stdout");
        return Ok(Box::new(tokio::io::stdout()));
    }

    let path = Path::new(output);
    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open report output {}: {}", path.display(), e))?;

    tracing::info!(output = %path.display(), "appending reports to file");
    Ok(Box::new(file))
}
