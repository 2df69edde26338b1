pub mod response;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::REQUEST_TIMEOUT;
use crate::service::PriceMonitor;

pub type SharedMonitor = Arc<PriceMonitor>;

pub fn create_router(monitor: SharedMonitor, assets_dir: &str) -> Router {
    Router::new()
        .route("/", get(routes::index_view))
        .route("/listview", get(routes::list_view))
        .route("/detailview", get(routes::detail_view))
        .route("/list/product", get(routes::list_product))
        .route("/addlink", post(routes::add_link))
        .route("/histories", get(routes::list_histories))
        .route("/ping", get(routes::ping))
        .nest_service("/static", ServeDir::new(assets_dir))
        .with_state(monitor)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(monitor: PriceMonitor, address: &str, assets_dir: &str) -> anyhow::Result<()> {
    let app = create_router(Arc::new(monitor), assets_dir);

    let listener = tokio::net::TcpListener::bind(address).await?;

    tracing::info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
