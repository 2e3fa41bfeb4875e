use tracing_subscriber::EnvFilter;

use atmolinkd::config::Config;
use atmolinkd::daemon::Daemon;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let daemon = Daemon::build(&config)?;
    let updates = daemon.spawn_update_logger();

    if let Err(err) = daemon.start().await {
        tracing::error!(%err, "cannot connect to the cloud account");
        daemon.shutdown().await;
        return Err(err.into());
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    daemon.shutdown().await;
    updates.abort();

    Ok(())
}
