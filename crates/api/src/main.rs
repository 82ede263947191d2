use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use orderdesk_api::app::{build_app, services::AppServices};
use orderdesk_api::config::AppConfig;
use orderdesk_infra::{InMemoryStore, PostgresStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    orderdesk_observability::init_with(config.log_format);

    if config.uses_dev_secret() {
        warn!("JWT_SECRET not set; using insecure dev default");
    }

    let postgres = match &config.database_url {
        Some(url) => {
            let pg = PostgresStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to DATABASE_URL")?;
            if config.run_migrations {
                pg.migrate().await.context("failed to apply migrations")?;
            }
            Some(pg)
        }
        None => None,
    };
    let store: Arc<dyn Store> = match &postgres {
        Some(pg) => Arc::new(pg.clone()),
        None => {
            warn!("DATABASE_URL not set; state is kept in memory and lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    let services = AppServices::build(store, &config.default_currency)
        .await
        .context("failed to load unit table")?;
    let app = build_app(config.jwt_secret.clone(), Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg) = postgres {
        pg.close().await;
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl_c; shutting down");
    }
}
