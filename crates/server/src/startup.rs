use std::net::SocketAddr;

use common::utils::logging::init_logging;
use configs::{AppConfig, RunEnv};
use dotenvy::dotenv;
use tracing::{error, info};

use crate::routes;
use crate::state::AppState;

/// Public entry: load config, open the database pool, serve until a
/// termination signal arrives, then release resources in order.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    RunEnv::init(config.env);
    init_logging(&config.log_level, "logs");

    let db = models::db::connect(&config.database).await?;
    info!("database connection established successfully");

    let state = AppState { db: db.clone(), config: config.clone() };
    let cors = routes::build_cors(&config);
    let app = routes::build_router(state, cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, env = %config.env, version = %config.api_version, "cloud service mapper API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("http server closed");

    // In-flight requests have drained; release the pool last
    if let Err(e) = db.close().await {
        error!(error = %e, "error during database disconnection");
        return Err(e.into());
    }
    info!("database connection closed gracefully");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives; `axum::serve` then stops
/// accepting connections and drains in-flight requests.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}
