pub mod carts;
pub mod menu_items;
pub mod orders;
pub mod restaurants;
pub mod users;

use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::core::app_state::AppState;

/// Standard mutation acknowledgement: a human message plus the entity id.
#[derive(Serialize, ToSchema)]
pub struct MutationRes {
    pub message: String,
    pub id: String,
}

/// Assemble the full API surface. The middleware needs the state, hence the
/// parameter.
pub fn api_router(state: &AppState) -> OpenApiRouter<AppState> {
    users::routes_with_openapi(state)
        .merge(restaurants::routes_with_openapi(state))
        .merge(menu_items::routes_with_openapi(state))
        .merge(carts::routes_with_openapi(state))
        .merge(orders::routes_with_openapi(state))
}
