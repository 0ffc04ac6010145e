//! `serve` command handler: bootstrap every backend the engine needs and
//! idle until interrupted.
//!
//! No HTTP server is started here — request routing is an explicit
//! external collaborator per spec §1, left to whatever RPC surface a
//! deployment puts in front of [`gentable_server::ServerRuntime`].

use gentable_error::GentableResult;
use gentable_server::{ServerConfig, ServerRuntime};
use tracing::info;

/// Build a [`ServerRuntime`] from [`ServerConfig::load`] and block until
/// `SIGINT`/`SIGTERM`, then flush and shut down.
pub async fn serve() -> GentableResult<()> {
    let config = ServerConfig::load()?;

    #[cfg(feature = "database")]
    let usage_sink: gentable_server::UsageSink = match config.database_url.is_some() {
        true => {
            let pool = gentable_database::establish_pool()?;
            gentable_database::run_migrations(&pool)?;
            let repo = std::sync::Arc::new(gentable_database::PostgresUsageEventRepository::new(pool));
            std::sync::Arc::new(move |events: Vec<gentable_core::UsageEvent>| {
                let repo = repo.clone();
                let buffered: Vec<gentable_cache::BufferedUsageEvent> = events
                    .into_iter()
                    .enumerate()
                    .map(|(id, event)| gentable_cache::BufferedUsageEvent { id: id as u64, event })
                    .collect();
                tokio::spawn(async move {
                    if let Err(err) = gentable_database::UsageEventRepository::record_batch(&*repo, &buffered).await {
                        tracing::error!(error = %err, "failed to persist usage events");
                    }
                });
            })
        }
        false => std::sync::Arc::new(|_events| {}),
    };
    #[cfg(not(feature = "database"))]
    let usage_sink: gentable_server::UsageSink = std::sync::Arc::new(|_events| {});

    let runtime = ServerRuntime::bootstrap(&config, usage_sink)?;

    info!("gentable runtime running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await.ok();
    info!("shutdown signal received, draining usage flusher");

    runtime.shutdown().await;
    Ok(())
}
