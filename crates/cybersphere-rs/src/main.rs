mod analysis;
mod api;
mod automation;
mod config;
mod db;
mod dispatcher;
mod events;
mod health;
mod models;
mod notify;
mod parser;
mod scanner;
mod ui;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::{api_check, execute_task, health, notify, task_history},
    config::AppConfig,
    dispatcher::TaskDispatcher,
    events::EventLog,
    health::HealthAggregator,
    notify::Notifier,
    scanner::SecurityScanner,
};

#[derive(Clone)]
pub struct AppState {
    pub events: EventLog,
    pub dispatcher: Arc<TaskDispatcher>,
    pub health: Arc<HealthAggregator>,
    pub notifier: Arc<Notifier>,
    pub scanner: Arc<SecurityScanner>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Arc::new(AppConfig::load());

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let events = EventLog::new(pool.clone());
    let scanner = Arc::new(SecurityScanner::new(&config)?);
    let dispatcher = Arc::new(TaskDispatcher::new(
        config.clone(),
        events.clone(),
        scanner.clone(),
    )?);
    let health_aggregator = Arc::new(HealthAggregator::new(config.clone(), pool.clone())?);
    let notifier = Arc::new(Notifier::new(config.clone())?);

    let state = AppState {
        events,
        dispatcher,
        health: health_aggregator,
        notifier,
        scanner,
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks/execute", post(execute_task))
        .route("/api/events", get(task_history))
        .route("/api/notify", post(notify))
        .route("/api/security/api-check", post(api_check))
        .route("/", get(ui::index))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "CyberSphere-RS listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}
