use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use restaurant_orderservice::core::app_state::AppState;
use restaurant_orderservice::core::{bootstrap, config};
use restaurant_orderservice::routes;
use restaurant_orderservice::store::gateway::Gateway;
use restaurant_orderservice::store::memory::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;
    let listen_addr = config.listen_addr.clone();

    // The storage engine is pluggable behind the TableStore seam; the
    // in-memory table backs local runs.
    let gateway = Gateway::new(Arc::new(MemoryStore::new()));
    let state = AppState::new(gateway, config);

    let routes = routes::api_router(&state);

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Restaurant OrderService API")
        .version("1.0.0")
        .build();
    let swagger_ui = SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi);

    let app = Router::new()
        .merge(routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(swagger_ui);

    bootstrap::serve("OrderService", app, &listen_addr).await
}
