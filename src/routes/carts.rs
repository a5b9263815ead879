use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Path, extract::State};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::auth::{self, RequestContext};
use crate::core::app_error::AppError;
use crate::core::app_state::AppState;
use crate::entities::TableEntity;
use crate::entities::cart::Cart;
use crate::store::Record;

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/carts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_cart))
            .routes(utoipa_axum::routes!(add_item_to_cart))
            .routes(utoipa_axum::routes!(remove_item_from_cart))
            .routes(utoipa_axum::routes!(clear_cart))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth::authenticate,
            )),
    )
}

#[derive(Serialize, ToSchema)]
struct CartRes {
    #[schema(value_type = Object)]
    cart: Record,
    /// Set when unavailable items were dropped by the mutation.
    message: Option<&'static str>,
}

/// The caller's cart; an empty default when none exists yet.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Carts"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The caller's cart", body = CartRes)
    )
)]
async fn get_cart(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let cart =
        Cart::load_or_default(&state.gateway, &context.company_id, &context.user_id).await?;
    Ok(Json(CartRes {
        cart: cart.to_client()?,
        message: None,
    }))
}

/// Add one unit of a menu item. Items from a different restaurant replace the
/// current cart.
#[utoipa::path(
    post,
    path = "/{restaurant_id}/{menu_item_id}",
    tags = ["Carts"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("menu_item_id" = String, Path, description = "Menu item id")
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartRes)
    )
)]
async fn add_item_to_cart(
    Path((restaurant_id, menu_item_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let (cart, message) = Cart::add_item(
        &state.gateway,
        &context.company_id,
        &context.user_id,
        &restaurant_id,
        &menu_item_id,
    )
    .await?;
    Ok(Json(CartRes {
        cart: cart.to_client()?,
        message,
    }))
}

/// Drop a line from the cart.
#[utoipa::path(
    delete,
    path = "/items/{menu_item_id}",
    tags = ["Carts"],
    security(("bearerAuth" = [])),
    params(("menu_item_id" = String, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Updated cart", body = CartRes)
    )
)]
async fn remove_item_from_cart(
    Path(menu_item_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let (cart, message) = Cart::remove_item(
        &state.gateway,
        &context.company_id,
        &context.user_id,
        &menu_item_id,
    )
    .await?;
    Ok(Json(CartRes {
        cart: cart.to_client()?,
        message,
    }))
}

#[derive(Serialize, ToSchema)]
struct ClearCartRes {
    message: &'static str,
}

/// Delete the cart wholesale.
#[utoipa::path(
    delete,
    path = "/",
    tags = ["Carts"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Cart cleared", body = ClearCartRes)
    )
)]
async fn clear_cart(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    Cart::delete(&state.gateway, &context.company_id, &context.user_id).await?;
    Ok(Json(ClearCartRes {
        message: "Cart was successfully cleared",
    }))
}
