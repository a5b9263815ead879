//! Tenant and caller resolution.
//!
//! The tenant comes from the request host, the caller from the bearer token;
//! both are resolved once per request into an immutable [`RequestContext`]
//! that is passed by parameter into every entity operation. Entities never
//! parse hosts or tokens themselves.

use std::collections::HashMap;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::app_error::AppError;
use crate::core::app_state::AppState;
use crate::core::config::Config;
use crate::entities::user::User;
use crate::entities::{TableEntity, UNAUTHORIZED_USER};
use crate::keys;
use crate::store::gateway::Gateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    RestaurantManager,
    CompanyAdmin,
    Admin,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Self::RestaurantManager | Self::CompanyAdmin | Self::Admin)
    }
}

/// Restaurant-scoped grants for managers: restaurant id → scope label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    #[serde(default)]
    pub restaurants: HashMap<String, String>,
}

/// Resolved tenant and caller identity for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub company_id: String,
    pub user_id: String,
    pub role: Role,
    pub permissions: Permissions,
}

impl RequestContext {
    /// Context for the unauthenticated checkout flow: tenant resolved, caller
    /// anonymous.
    pub fn guest(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            user_id: UNAUTHORIZED_USER.to_owned(),
            role: Role::User,
            permissions: Permissions::default(),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.user_id == UNAUTHORIZED_USER
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::AccessDenied)
        }
    }

    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::AccessDenied)
        }
    }

    /// Admins and company admins manage every restaurant of their tenant;
    /// managers only the restaurants they hold a grant for.
    pub fn require_restaurant_access(&self, restaurant_id: &str) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::CompanyAdmin => Ok(()),
            Role::RestaurantManager => {
                if self.permissions.restaurants.contains_key(restaurant_id) {
                    Ok(())
                } else {
                    Err(AppError::AccessDenied)
                }
            }
            Role::User => Err(AppError::AccessDenied),
        }
    }
}

/// Map the request host to a tenant. Fails with `UnknownDomain` for hosts the
/// deployment does not serve.
pub fn resolve_company_id(config: &Config, host: &str) -> Result<String, AppError> {
    let host = host.split(':').next().unwrap_or(host);
    config
        .tenant_domains
        .get(host)
        .or(config.default_company_id.as_ref())
        .cloned()
        .ok_or_else(|| {
            tracing::warn!(host, "no tenant configured for host");
            AppError::UnknownDomain
        })
}

/// Resolve the caller from a bearer token by loading the tenant's user
/// record. An unknown token is indistinguishable from a missing one.
pub async fn resolve_identity(
    gateway: &Gateway,
    company_id: &str,
    token: &str,
) -> Result<RequestContext, AppError> {
    let record = gateway
        .get(&keys::user_key(company_id, token))
        .await
        .map_err(|error| match error {
            AppError::NotFound => AppError::NotAuthorized,
            other => other,
        })?;
    let user = User::from_record(record)?;
    Ok(RequestContext {
        company_id: company_id.to_owned(),
        user_id: user.id.clone(),
        role: user.role.unwrap_or(Role::User),
        permissions: user.permissions.unwrap_or_default(),
    })
}

fn host_of(request: &Request) -> Result<&str, AppError> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::UnknownDomain)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Middleware for authenticated routes: resolves tenant and identity, then
/// exposes the context as a request extension.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let company_id = resolve_company_id(&state.config, host_of(&request)?)?;
    let token = bearer_token(&request).ok_or(AppError::NotAuthorized)?;
    let context = resolve_identity(&state.gateway, &company_id, token).await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Middleware for the guest checkout routes: tenant resolution only.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let company_id = resolve_company_id(&state.config, host_of(&request)?)?;
    request
        .extensions_mut()
        .insert(RequestContext::guest(company_id));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_context(restaurant_id: &str) -> RequestContext {
        let mut permissions = Permissions::default();
        permissions
            .restaurants
            .insert(restaurant_id.to_owned(), "manage".to_owned());
        RequestContext {
            company_id: "c1".to_owned(),
            user_id: "m1".to_owned(),
            role: Role::RestaurantManager,
            permissions,
        }
    }

    #[test]
    fn manager_access_is_gated_by_the_restaurant_grant() {
        let context = manager_context("r1");
        assert!(context.require_restaurant_access("r1").is_ok());
        assert!(matches!(
            context.require_restaurant_access("r2"),
            Err(AppError::AccessDenied)
        ));
    }

    #[test]
    fn company_admin_manages_every_restaurant() {
        let context = RequestContext {
            company_id: "c1".to_owned(),
            user_id: "a1".to_owned(),
            role: Role::CompanyAdmin,
            permissions: Permissions::default(),
        };
        assert!(context.require_restaurant_access("anything").is_ok());
    }

    #[test]
    fn plain_users_never_manage_restaurants() {
        let context = RequestContext {
            company_id: "c1".to_owned(),
            user_id: "u1".to_owned(),
            role: Role::User,
            permissions: Permissions::default(),
        };
        assert!(matches!(
            context.require_restaurant_access("r1"),
            Err(AppError::AccessDenied)
        ));
    }

    #[test]
    fn unknown_hosts_are_rejected() {
        let config = Config {
            listen_addr: String::new(),
            tenant_domains: HashMap::from([("food.example.com".to_owned(), "c1".to_owned())]),
            default_company_id: None,
        };
        assert_eq!(
            resolve_company_id(&config, "food.example.com:8080").unwrap(),
            "c1"
        );
        assert!(matches!(
            resolve_company_id(&config, "other.example.com"),
            Err(AppError::UnknownDomain)
        ));
    }
}
