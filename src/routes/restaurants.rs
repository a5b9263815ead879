use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Path, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::auth::{self, RequestContext, Role};
use crate::core::app_error::AppError;
use crate::core::app_state::AppState;
use crate::entities::TableEntity;
use crate::entities::restaurant::{Restaurant, RestaurantBody};
use crate::routes::MutationRes;

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/restaurants",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_restaurants))
            .routes(utoipa_axum::routes!(get_restaurant))
            .routes(utoipa_axum::routes!(create_restaurant))
            .routes(utoipa_axum::routes!(update_restaurant))
            .routes(utoipa_axum::routes!(archive_restaurant))
            .routes(utoipa_axum::routes!(get_delivery_price))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth::authenticate,
            )),
    )
}

/// All active restaurants of the tenant.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Active restaurants of the tenant")
    )
)]
async fn get_restaurants(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let restaurants = Restaurant::list_active(&state.gateway, &context.company_id).await?;
    Ok(Json(restaurants))
}

/// One restaurant by id; archived ones stay fetchable directly.
#[utoipa::path(
    get,
    path = "/{restaurant_id}",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(("restaurant_id" = String, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "The restaurant record")
    )
)]
async fn get_restaurant(
    Path(restaurant_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let restaurant =
        Restaurant::load(&state.gateway, &context.company_id, &restaurant_id).await?;
    Ok(Json(restaurant.to_client()?))
}

/// Create a restaurant (company admins and admins).
#[utoipa::path(
    post,
    path = "/",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    request_body = RestaurantBody,
    responses(
        (status = 200, description = "Restaurant created", body = MutationRes)
    )
)]
async fn create_restaurant(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<RestaurantBody>,
) -> Result<impl IntoResponse, AppError> {
    context.require_role(&[Role::CompanyAdmin, Role::Admin])?;
    let restaurant = Restaurant::new_from_request(&context, body);
    restaurant.create(&state.gateway).await?;
    Ok(Json(MutationRes {
        message: "Restaurant successfully created".to_owned(),
        id: restaurant.id,
    }))
}

/// Update a restaurant in place.
#[utoipa::path(
    put,
    path = "/{restaurant_id}",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(("restaurant_id" = String, Path, description = "Restaurant id")),
    request_body = RestaurantBody,
    responses(
        (status = 200, description = "Restaurant updated", body = MutationRes)
    )
)]
async fn update_restaurant(
    Path(restaurant_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<RestaurantBody>,
) -> Result<impl IntoResponse, AppError> {
    context.require_restaurant_access(&restaurant_id)?;
    let restaurant = Restaurant::update_from_request(&context, &restaurant_id, body);
    restaurant.update(&state.gateway).await?;
    Ok(Json(MutationRes {
        message: "Restaurant was successfully updated".to_owned(),
        id: restaurant.id,
    }))
}

/// Soft-delete: the archive flag goes through the same update path.
#[utoipa::path(
    delete,
    path = "/{restaurant_id}",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(("restaurant_id" = String, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant archived", body = MutationRes)
    )
)]
async fn archive_restaurant(
    Path(restaurant_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    context.require_role(&[Role::CompanyAdmin, Role::Admin])?;
    Restaurant::archive(&state.gateway, &context, &restaurant_id).await?;
    Ok(Json(MutationRes {
        message: "Restaurant was successfully archived".to_owned(),
        id: restaurant_id,
    }))
}

#[derive(Deserialize, ToSchema)]
struct DeliveryPriceReq {
    address: String,
}

#[derive(Serialize, ToSchema)]
struct DeliveryPriceRes {
    #[schema(value_type = f64)]
    delivery_price: Decimal,
}

/// Quote the delivery price to an address.
#[utoipa::path(
    post,
    path = "/{restaurant_id}/delivery-price",
    tags = ["Restaurants"],
    security(("bearerAuth" = [])),
    params(("restaurant_id" = String, Path, description = "Restaurant id")),
    request_body = DeliveryPriceReq,
    responses(
        (status = 200, description = "Quoted delivery price", body = DeliveryPriceRes)
    )
)]
async fn get_delivery_price(
    Path(restaurant_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<DeliveryPriceReq>,
) -> Result<impl IntoResponse, AppError> {
    let restaurant =
        Restaurant::load(&state.gateway, &context.company_id, &restaurant_id).await?;
    let delivery_price = restaurant.delivery_price(&body.address)?;
    Ok(Json(DeliveryPriceRes { delivery_price }))
}
