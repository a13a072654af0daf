use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use dotenvy::dotenv;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod badges;
mod config;
mod db;
mod engine;
mod ingest;
mod memory;
mod quests;
mod state;
mod store;
mod streak;
mod verify;

use config::Config;
use quests::QuestPool;
use state::AppState;
use store::pg::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = install_metrics();
    let config = Config::from_env()?;

    let pool = db::init_pool(&config.database_url).await?;
    db::init_schema(&pool).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid HOST/PORT: {e}"))?;
    let creator = config.creator_wallet.clone();
    let webhook_configured = config.webhook_secret.is_some();

    let app_state = AppState {
        store: Arc::new(PgStore::new(pool)),
        quests: QuestPool::standard(),
        config: Arc::new(config),
        metrics: metrics_handle,
    };

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/metrics", get(api::metrics))
        .route("/quest", get(api::quest_overview))
        .route("/quest/preview", get(api::quest_preview))
        .route("/quest/pool", get(api::quest_pool))
        .route("/quest/claims", get(api::quest_claims))
        .route("/quest/claim", post(api::submit_claim))
        .route("/wallet/:wallet", get(api::wallet_detail))
        .route("/wallet/:wallet/progress", get(api::wallet_progress))
        .route("/actors", get(api::actors))
        .route("/debug/raw", get(api::debug_raw))
        .route("/webhook/helius", post(ingest::webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    info!("listening on {}", addr);
    info!("creator wallet: {}", creator);
    if !webhook_configured {
        info!("WEBHOOK_SECRET not set; ingestion disabled");
    }

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn install_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("install metrics recorder")
}
