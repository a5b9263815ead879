use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Path, extract::State};
use utoipa_axum::router::OpenApiRouter;

use crate::auth::{self, RequestContext};
use crate::core::app_error::AppError;
use crate::core::app_state::AppState;
use crate::entities::TableEntity;
use crate::entities::user::{ConfirmedUserBody, User, UserProfileBody};
use crate::routes::MutationRes;

/// User routes: the identity-provider confirmation hook plus self-service
/// profile access.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let authenticated = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_user))
        .routes(utoipa_axum::routes!(update_user))
        .routes(utoipa_axum::routes!(delete_manager))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));
    let hook = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(user_confirmation_hook))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_tenant,
        ));
    OpenApiRouter::new()
        .nest("/users", authenticated)
        .nest("/hooks", hook)
}

/// Post-confirmation hook from the identity provider: materialize the user
/// record for the tenant.
#[utoipa::path(
    post,
    path = "/user-confirmation",
    tags = ["Users"],
    request_body = ConfirmedUserBody,
    responses(
        (status = 200, description = "User record created", body = MutationRes)
    )
)]
async fn user_confirmation_hook(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<ConfirmedUserBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::from_confirmation(&context.company_id, body);
    user.create(&state.gateway).await?;
    Ok(Json(MutationRes {
        message: "User was successfully created".to_owned(),
        id: user.id,
    }))
}

/// Fetch the authenticated user's own record.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The caller's user record")
    )
)]
async fn get_user(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::load(&state.gateway, &context.company_id, &context.user_id).await?;
    Ok(Json(user.to_client()?))
}

/// Update the authenticated user's profile fields.
#[utoipa::path(
    put,
    path = "/",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    request_body = UserProfileBody,
    responses(
        (status = 200, description = "Profile updated", body = MutationRes)
    )
)]
async fn update_user(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<UserProfileBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::for_profile_update(&context, body);
    user.update(&state.gateway).await?;
    Ok(Json(MutationRes {
        message: "User was successfully updated".to_owned(),
        id: user.id,
    }))
}

/// Remove a manager account (company admins only).
#[utoipa::path(
    delete,
    path = "/{user_id}",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Manager account to remove")),
    responses(
        (status = 200, description = "Manager account removed", body = MutationRes)
    )
)]
async fn delete_manager(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    User::delete_manager(&state.gateway, &context, &user_id).await?;
    Ok(Json(MutationRes {
        message: "User was successfully deleted".to_owned(),
        id: user_id,
    }))
}
