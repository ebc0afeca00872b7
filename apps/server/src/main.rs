use orderdeck_server::{api::app_router, build_state, config::Config, init_tracing, watcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();
    let state = build_state(&config).await?;

    // Real-time pipeline. A failed subscription here is fatal: without the
    // watcher the dashboard would silently stop being real-time.
    watcher::start_order_watcher(state.clone()).await?;

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
