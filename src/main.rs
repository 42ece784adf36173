use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pravda_exchange::config::AppConfig;
use pravda_exchange::db::Database;
use pravda_exchange::services::indexer::client::ChainClient;
use pravda_exchange::services::indexer::DepositIndexer;
use pravda_exchange::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    init_tracing(&config);

    tracing::info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "starting pravda-exchange"
    );

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("database connected");

    let mut indexer = if config.chain.indexer_enabled {
        let client = ChainClient::new(
            config.chain.api_url.clone(),
            config.chain.api_key.clone(),
            config.chain.retry_attempts,
            config.chain.retry_delay_secs,
        );
        let mut indexer = DepositIndexer::new(
            db.pool.clone(),
            client,
            config.chain.receiving_address.clone(),
            Duration::from_secs(config.chain.poll_interval_secs),
            config.chain.deposit_rate,
            config.chain.min_deposit_chain_units,
        );
        indexer.start();
        Some(indexer)
    } else {
        tracing::warn!("deposit indexer disabled by configuration");
        None
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
    });

    let cors = if config.allowed_origins == "*" {
        CorsLayer::new().allow_origin(AllowOrigin::any())
    } else {
        let origins = config
            .allowed_origins_list()
            .into_iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
    .allow_methods(tower_http::cors::Any)
    .allow_headers(tower_http::cors::Any);

    let app: Router = api::routes::create_router(state.clone())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = shutdown_signal();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Some(mut indexer) = indexer {
        indexer.stop().await;
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pravda_exchange={}", config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
