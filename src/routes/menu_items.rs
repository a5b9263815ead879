use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Path, extract::State};
use utoipa_axum::router::OpenApiRouter;

use crate::auth::{self, RequestContext};
use crate::core::app_error::AppError;
use crate::core::app_state::AppState;
use crate::entities::TableEntity;
use crate::entities::menu_item::{MenuItem, MenuItemBody};
use crate::routes::MutationRes;

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/menu-items",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_menu_items))
            .routes(utoipa_axum::routes!(get_menu_item))
            .routes(utoipa_axum::routes!(create_menu_item))
            .routes(utoipa_axum::routes!(update_menu_item))
            .routes(utoipa_axum::routes!(archive_menu_item))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth::authenticate,
            )),
    )
}

/// Active menu of one restaurant.
#[utoipa::path(
    get,
    path = "/{restaurant_id}",
    tags = ["MenuItems"],
    security(("bearerAuth" = [])),
    params(("restaurant_id" = String, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Non-archived menu items of the restaurant")
    )
)]
async fn get_menu_items(
    Path(restaurant_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let menu_items =
        MenuItem::list_for_restaurant(&state.gateway, &context.company_id, &restaurant_id).await?;
    Ok(Json(menu_items))
}

/// One menu item by id.
#[utoipa::path(
    get,
    path = "/{restaurant_id}/{menu_item_id}",
    tags = ["MenuItems"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("menu_item_id" = String, Path, description = "Menu item id")
    ),
    responses(
        (status = 200, description = "The menu item record")
    )
)]
async fn get_menu_item(
    Path((restaurant_id, menu_item_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let item = MenuItem::load(
        &state.gateway,
        &context.company_id,
        &restaurant_id,
        &menu_item_id,
    )
    .await?;
    Ok(Json(item.to_client()?))
}

/// Add a menu item to a restaurant the caller manages.
#[utoipa::path(
    post,
    path = "/{restaurant_id}",
    tags = ["MenuItems"],
    security(("bearerAuth" = [])),
    params(("restaurant_id" = String, Path, description = "Restaurant id")),
    request_body = MenuItemBody,
    responses(
        (status = 200, description = "Menu item created", body = MutationRes)
    )
)]
async fn create_menu_item(
    Path(restaurant_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<MenuItemBody>,
) -> Result<impl IntoResponse, AppError> {
    context.require_restaurant_access(&restaurant_id)?;
    let item = MenuItem::new_from_request(&context, &restaurant_id, body);
    item.create(&state.gateway).await?;
    Ok(Json(MutationRes {
        message: "Menu item successfully created".to_owned(),
        id: item.id,
    }))
}

/// Update a menu item in place.
#[utoipa::path(
    put,
    path = "/{restaurant_id}/{menu_item_id}",
    tags = ["MenuItems"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("menu_item_id" = String, Path, description = "Menu item id")
    ),
    request_body = MenuItemBody,
    responses(
        (status = 200, description = "Menu item updated", body = MutationRes)
    )
)]
async fn update_menu_item(
    Path((restaurant_id, menu_item_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<MenuItemBody>,
) -> Result<impl IntoResponse, AppError> {
    context.require_restaurant_access(&restaurant_id)?;
    let item = MenuItem::update_from_request(&context, &restaurant_id, &menu_item_id, body);
    item.update(&state.gateway).await?;
    Ok(Json(MutationRes {
        message: "Menu item was successfully updated".to_owned(),
        id: item.id,
    }))
}

/// Soft-delete a menu item via the archive flag.
#[utoipa::path(
    delete,
    path = "/{restaurant_id}/{menu_item_id}",
    tags = ["MenuItems"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("menu_item_id" = String, Path, description = "Menu item id")
    ),
    responses(
        (status = 200, description = "Menu item archived", body = MutationRes)
    )
)]
async fn archive_menu_item(
    Path((restaurant_id, menu_item_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    context.require_restaurant_access(&restaurant_id)?;
    MenuItem::archive(&state.gateway, &context, &restaurant_id, &menu_item_id).await?;
    Ok(Json(MutationRes {
        message: "Menu item was successfully archived".to_owned(),
        id: menu_item_id,
    }))
}
