use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::auth::{self, RequestContext, Role};
use crate::core::app_error::AppError;
use crate::core::app_state::AppState;
use crate::entities::TableEntity;
use crate::entities::order::{
    DraftPreOrderBody, GuestPreOrderBody, Order, PreOrder, UpdateOrderBody,
};
use crate::routes::MutationRes;
use crate::store::Record;

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let authenticated = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(draft_pre_order))
        .routes(utoipa_axum::routes!(create_order))
        .routes(utoipa_axum::routes!(get_my_orders))
        .routes(utoipa_axum::routes!(get_order))
        .routes(utoipa_axum::routes!(get_restaurant_orders))
        .routes(utoipa_axum::routes!(get_user_orders))
        .routes(utoipa_axum::routes!(update_order))
        .routes(utoipa_axum::routes!(archive_order))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    // Guest checkout flow: only the tenant is resolved, the caller stays the
    // fixed anonymous user.
    let guest = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(draft_pre_order_unauthorized))
        .routes(utoipa_axum::routes!(create_order_unauthorized))
        .routes(utoipa_axum::routes!(get_order_unauthorized))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_tenant,
        ));

    OpenApiRouter::new().nest("/orders", authenticated.merge(guest))
}

/// Draft a pre-order from the caller's cart.
#[utoipa::path(
    post,
    path = "/pre-order",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = DraftPreOrderBody,
    responses(
        (status = 200, description = "Drafted pre-order snapshot")
    )
)]
async fn draft_pre_order(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<DraftPreOrderBody>,
) -> Result<impl IntoResponse, AppError> {
    let pre_order = PreOrder::draft_from_cart(&state.gateway, &context, body).await?;
    Ok(Json(pre_order.to_client()?))
}

/// Guest variant: the items come with the request instead of a cart.
#[utoipa::path(
    post,
    path = "/pre-order/unauthorized",
    tags = ["Orders"],
    request_body = GuestPreOrderBody,
    responses(
        (status = 200, description = "Drafted pre-order snapshot")
    )
)]
async fn draft_pre_order_unauthorized(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<GuestPreOrderBody>,
) -> Result<impl IntoResponse, AppError> {
    let pre_order = PreOrder::draft_from_items(&state.gateway, &context.company_id, body).await?;
    Ok(Json(pre_order.to_client()?))
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    pre_order_id: String,
}

/// Promote a drafted pre-order into an order.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = Order::create_from_pre_order(&state.gateway, &context, &body.pre_order_id).await?;
    Ok(Json(order.to_client()?))
}

/// Guest promotion; no cart exists to clear.
#[utoipa::path(
    post,
    path = "/unauthorized",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order")
    )
)]
async fn create_order_unauthorized(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = Order::create_from_pre_order(&state.gateway, &context, &body.pre_order_id).await?;
    Ok(Json(order.to_client()?))
}

/// The caller's orders across restaurants, via the user-scoped index.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The caller's non-archived orders")
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let orders =
        Order::list_for_user(&state.gateway, &context.company_id, &context.user_id).await?;
    Ok(Json(orders))
}

/// Any user's orders (admins only).
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user's non-archived orders")
    )
)]
async fn get_user_orders(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    context.require_role(&[Role::CompanyAdmin, Role::Admin])?;
    let orders = Order::list_for_user(&state.gateway, &context.company_id, &user_id).await?;
    Ok(Json(orders))
}

/// One order; the owner or staff.
#[utoipa::path(
    get,
    path = "/id/{restaurant_id}/{order_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("order_id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "The order record")
    )
)]
async fn get_order(
    Path((restaurant_id, order_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let order = Order::get_by_id(&state.gateway, &context, &restaurant_id, &order_id).await?;
    Ok(Json(order.to_client()?))
}

/// Guest lookup of a guest-placed order.
#[utoipa::path(
    get,
    path = "/id/unauthorized/{restaurant_id}/{order_id}",
    tags = ["Orders"],
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("order_id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "The order record")
    )
)]
async fn get_order_unauthorized(
    Path((restaurant_id, order_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let order = Order::get_by_id(&state.gateway, &context, &restaurant_id, &order_id).await?;
    Ok(Json(order.to_client()?))
}

#[derive(Deserialize, IntoParams)]
struct PageQuery {
    limit: Option<usize>,
    cursor: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct OrdersPageRes {
    #[schema(value_type = Vec<Object>)]
    orders: Vec<Record>,
    /// Pass back verbatim to fetch the next page.
    cursor: Option<String>,
}

/// One page of a restaurant's orders, for staff dashboards.
#[utoipa::path(
    get,
    path = "/restaurant/{restaurant_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "A page of the restaurant's orders", body = OrdersPageRes)
    )
)]
async fn get_restaurant_orders(
    Path(restaurant_id): Path<String>,
    Query(page): Query<PageQuery>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let (orders, cursor) = Order::list_for_restaurant(
        &state.gateway,
        &context,
        &restaurant_id,
        page.limit,
        page.cursor.as_deref(),
    )
    .await?;
    Ok(Json(OrdersPageRes { orders, cursor }))
}

/// Staff update of the whitelisted order fields.
#[utoipa::path(
    put,
    path = "/{restaurant_id}/{order_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("order_id" = String, Path, description = "Order id")
    ),
    request_body = UpdateOrderBody,
    responses(
        (status = 200, description = "Order updated", body = MutationRes)
    )
)]
async fn update_order(
    Path((restaurant_id, order_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<UpdateOrderBody>,
) -> Result<impl IntoResponse, AppError> {
    Order::update_by_staff(&state.gateway, &context, &restaurant_id, &order_id, body).await?;
    Ok(Json(MutationRes {
        message: "Order was successfully updated".to_owned(),
        id: order_id,
    }))
}

/// Archive an order: owners their own, staff any.
#[utoipa::path(
    delete,
    path = "/{restaurant_id}/{order_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("restaurant_id" = String, Path, description = "Restaurant id"),
        ("order_id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Order archived", body = MutationRes)
    )
)]
async fn archive_order(
    Path((restaurant_id, order_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    Order::archive(&state.gateway, &context, &restaurant_id, &order_id).await?;
    Ok(Json(MutationRes {
        message: "Order was successfully archived".to_owned(),
        id: order_id,
    }))
}
