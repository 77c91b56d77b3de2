use anyhow::Result;
use clap::Parser;

use ctmon_daemon::cli::DaemonCli;
use ctmon_daemon::logging;
use ctmon_daemon::supervisor::Supervisor;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    let (config, rejected) = cli.load_config().await?;

    if cli.validate {
        for entry in &rejected {
            eprintln!(
                "warning: ignoring {}={:?}: not a valid value",
                entry.env_key, entry.value
            );
        }
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    for entry in &rejected {
        entry.warn();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        output = %config.report.output,
        "ctmon starting"
    );

    let mut supervisor = Supervisor::build_from_config(config)?;
    supervisor.run().await?;

    tracing::info!("ctmon shut down");
    Ok(())
}
