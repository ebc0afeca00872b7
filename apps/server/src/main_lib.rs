use std::sync::Arc;

use crate::{config::Config, events::BroadcastHub};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use orderdeck_core::{
    feed::{CheckpointStoreTrait, OrderChangeFeedTrait},
    orders::{OrderService, OrderServiceTrait},
};
use orderdeck_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, CheckpointRepository, OrderRepository,
    SqliteChangeFeed,
};

pub struct AppState {
    pub order_service: Arc<dyn OrderServiceTrait + Send + Sync>,
    pub change_feed: Arc<dyn OrderChangeFeedTrait + Send + Sync>,
    pub checkpoints: Arc<dyn CheckpointStoreTrait + Send + Sync>,
    pub hub: BroadcastHub,
    pub db_path: String,
}

pub fn init_tracing() {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;

    // Single change feed instance; the writer actor publishes into it after
    // every committed mutation.
    let change_feed = Arc::new(SqliteChangeFeed::new(pool.clone()));
    let writer = spawn_writer((*pool).clone(), change_feed.publisher());

    let order_repository = Arc::new(OrderRepository::new(pool.clone(), writer.clone()));
    let order_service = Arc::new(OrderService::new(order_repository));

    let checkpoints = Arc::new(CheckpointRepository::new(pool.clone(), writer.clone()));

    Ok(Arc::new(AppState {
        order_service,
        change_feed,
        checkpoints,
        hub: BroadcastHub::new(),
        db_path,
    }))
}
