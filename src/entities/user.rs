//! User accounts.
//!
//! Users are created by the identity provider's post-confirmation hook, not
//! by a public endpoint; afterwards they update their own profile fields.
//! Managers additionally carry restaurant grants under `permissions_`, which
//! are never self-updatable and therefore stay outside the field schema.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Permissions, RequestContext, Role};
use crate::core::app_error::AppError;
use crate::entities::{FieldSpec, Kind, Mutability, TableEntity, field, now_iso};
use crate::keys;
use crate::store::RecordKey;
use crate::store::gateway::Gateway;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "id_")]
    pub id: String,
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_phone_numbers: Option<Vec<String>>,
    #[serde(
        rename = "permissions_",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub permissions: Option<Permissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,
}

const SCHEMA: &[FieldSpec] = &[
    field("id_", Kind::Str, Mutability::CreateOnly),
    field("login", Kind::Str, Mutability::CreateOnly),
    field("phone", Kind::Str, Mutability::CreateOnly),
    field("email", Kind::Str, Mutability::CreateOnly),
    field("role", Kind::Str, Mutability::CreateOnly),
    field("date_created", Kind::Str, Mutability::CreateOnly),
    field("date_updated", Kind::Str, Mutability::Required),
    field("first_name", Kind::Str, Mutability::Optional),
    field("last_name", Kind::Str, Mutability::Optional),
    field("addresses", Kind::List, Mutability::Optional),
    field("additional_phone_numbers", Kind::List, Mutability::Optional),
];

impl TableEntity for User {
    const RECORD_TYPE: &'static str = "user";

    fn schema() -> &'static [FieldSpec] {
        SCHEMA
    }

    fn primary_key(&self) -> RecordKey {
        keys::user_key(&self.company_id, &self.id)
    }
}

/// Attributes delivered by the identity provider once a sign-up is confirmed.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConfirmedUserBody {
    pub id: String,
    pub login: String,
    pub phone: String,
    pub email: String,
    pub role: Option<Role>,
    pub permissions: Option<Permissions>,
}

/// Self-service profile fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserProfileBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub addresses: Option<Vec<String>>,
    pub additional_phone_numbers: Option<Vec<String>>,
}

impl User {
    /// New account from the identity provider's post-confirmation hook.
    pub fn from_confirmation(company_id: &str, body: ConfirmedUserBody) -> Self {
        let now = now_iso();
        Self {
            id: body.id,
            company_id: company_id.to_owned(),
            login: Some(body.login),
            phone: Some(body.phone),
            email: Some(body.email),
            role: Some(body.role.unwrap_or(Role::User)),
            first_name: None,
            last_name: None,
            addresses: None,
            additional_phone_numbers: None,
            permissions: body.permissions,
            date_created: Some(now.clone()),
            date_updated: Some(now),
        }
    }

    /// Patch carrier for a self-service profile update. Only the mutable
    /// profile fields are populated; everything else stays out of the patch.
    pub fn for_profile_update(context: &RequestContext, body: UserProfileBody) -> Self {
        Self {
            id: context.user_id.clone(),
            company_id: context.company_id.clone(),
            login: None,
            phone: None,
            email: None,
            role: None,
            first_name: body.first_name,
            last_name: body.last_name,
            addresses: body.addresses,
            additional_phone_numbers: body.additional_phone_numbers,
            permissions: None,
            date_created: None,
            date_updated: Some(now_iso()),
        }
    }

    pub async fn load(gateway: &Gateway, company_id: &str, user_id: &str) -> Result<Self, AppError> {
        let record = gateway.get(&keys::user_key(company_id, user_id)).await?;
        Self::from_record(record)
    }

    /// Company admins may remove manager accounts; nothing else is ever
    /// deleted through the normal flow.
    pub async fn delete_manager(
        gateway: &Gateway,
        context: &RequestContext,
        user_id: &str,
    ) -> Result<(), AppError> {
        context.require_role(&[Role::CompanyAdmin, Role::Admin])?;
        let target = Self::load(gateway, &context.company_id, user_id).await?;
        if target.role != Some(Role::RestaurantManager) {
            return Err(AppError::AccessDenied);
        }
        gateway.delete(&target.primary_key()).await?;
        tracing::info!(user_id, "manager account deleted");
        Ok(())
    }
}
