//! Restaurants, the unit a tenant publishes menus under.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::RequestContext;
use crate::core::app_error::AppError;
use crate::entities::{
    FieldSpec, Kind, Mutability, TableEntity, field, new_entity_id, now_iso,
};
use crate::keys;
use crate::store::gateway::Gateway;
use crate::store::{FilterCondition, QueryRequest, Record, RecordKey};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(rename = "id_")]
    pub id: String,
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<Decimal>,
    /// Free-form tenant settings; carries the ordered category sequence the
    /// storefront renders menus in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Map<String, Value>>,
    #[serde(
        rename = "status_",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

const SCHEMA: &[FieldSpec] = &[
    field("id_", Kind::Str, Mutability::CreateOnly),
    field("created_by", Kind::Str, Mutability::CreateOnly),
    field("date_created", Kind::Str, Mutability::CreateOnly),
    field("title", Kind::Str, Mutability::Required),
    field("address", Kind::Str, Mutability::Required),
    field("description", Kind::Str, Mutability::Required),
    field("cuisine", Kind::List, Mutability::Required),
    field("opening_time", Kind::Whole, Mutability::Required),
    field("closing_time", Kind::Whole, Mutability::Required),
    field("settings", Kind::Map, Mutability::Required),
    field("status_", Kind::Str, Mutability::Required),
    field("date_updated", Kind::Str, Mutability::Required),
    field("updated_by", Kind::Str, Mutability::Required),
    field("archived", Kind::Bool, Mutability::Required),
];

impl TableEntity for Restaurant {
    const RECORD_TYPE: &'static str = "restaurant";

    fn schema() -> &'static [FieldSpec] {
        SCHEMA
    }

    fn primary_key(&self) -> RecordKey {
        keys::restaurant_key(&self.company_id, &self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RestaurantBody {
    pub title: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<Vec<String>>,
    #[schema(value_type = Option<f64>)]
    pub opening_time: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub closing_time: Option<Decimal>,
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Map<String, Value>>,
    pub status: Option<String>,
}

impl Restaurant {
    /// New restaurant from a create request; admin-facing defaults filled in.
    pub fn new_from_request(context: &RequestContext, body: RestaurantBody) -> Self {
        let now = now_iso();
        Self {
            id: new_entity_id(),
            company_id: context.company_id.clone(),
            title: body.title,
            address: body.address,
            description: body.description,
            cuisine: Some(body.cuisine.unwrap_or_default()),
            opening_time: body.opening_time.map(|t| t.round_dp(0)),
            closing_time: body.closing_time.map(|t| t.round_dp(0)),
            settings: Some(body.settings.unwrap_or_default()),
            status: Some(body.status.unwrap_or_else(|| "new".to_owned())),
            created_by: Some(context.user_id.clone()),
            updated_by: Some(context.user_id.clone()),
            date_created: Some(now.clone()),
            date_updated: Some(now),
            archived: Some(false),
        }
    }

    /// Patch carrier for an update request; only the provided fields make it
    /// into the patch.
    pub fn update_from_request(
        context: &RequestContext,
        restaurant_id: &str,
        body: RestaurantBody,
    ) -> Self {
        Self {
            id: restaurant_id.to_owned(),
            company_id: context.company_id.clone(),
            title: body.title,
            address: body.address,
            description: body.description,
            cuisine: body.cuisine,
            opening_time: body.opening_time.map(|t| t.round_dp(0)),
            closing_time: body.closing_time.map(|t| t.round_dp(0)),
            settings: body.settings,
            status: body.status,
            created_by: None,
            updated_by: Some(context.user_id.clone()),
            date_created: None,
            date_updated: Some(now_iso()),
            archived: None,
        }
    }

    pub async fn load(
        gateway: &Gateway,
        company_id: &str,
        restaurant_id: &str,
    ) -> Result<Self, AppError> {
        let record = gateway
            .get(&keys::restaurant_key(company_id, restaurant_id))
            .await?;
        Self::from_record(record)
    }

    /// All non-archived restaurants of the tenant, in client shape. Archived
    /// records stay in the partition and are filtered out here, never
    /// deleted.
    pub async fn list_active(gateway: &Gateway, company_id: &str) -> Result<Vec<Record>, AppError> {
        let records = gateway
            .query_all(
                QueryRequest::partition(keys::restaurants_partition(company_id))
                    .with_filter(FilterCondition::AttrEq("archived", Value::Bool(false))),
            )
            .await?;
        records
            .into_iter()
            .map(|record| Self::from_record(record)?.to_client())
            .collect()
    }

    /// Archive through the regular update path with a forced
    /// `{archived: true}` body. The record is loaded first so the patch
    /// carries its current values rather than constructor defaults.
    pub async fn archive(
        gateway: &Gateway,
        context: &RequestContext,
        restaurant_id: &str,
    ) -> Result<(), AppError> {
        let mut restaurant = Self::load(gateway, &context.company_id, restaurant_id).await?;
        restaurant.archived = Some(true);
        restaurant.updated_by = Some(context.user_id.clone());
        restaurant.date_updated = Some(now_iso());
        restaurant.update(gateway).await
    }

    /// Delivery price for an address. Real distance-based pricing is not
    /// implemented; the interface is fixed for callers.
    pub fn delivery_price(&self, delivery_address: &str) -> Result<Decimal, AppError> {
        if delivery_address.trim().is_empty() {
            return Err(AppError::InvalidAddress);
        }
        Ok(Decimal::ZERO.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_body() -> RestaurantBody {
        RestaurantBody {
            title: Some("Blue Door".to_owned()),
            address: Some("Time Square, New York".to_owned()),
            description: Some("Neighbourhood bistro".to_owned()),
            cuisine: Some(vec!["french".to_owned()]),
            opening_time: Some(Decimal::from(10)),
            closing_time: Some(Decimal::from(23)),
            settings: None,
            status: None,
        }
    }

    #[test]
    fn create_record_passes_validation_with_defaults() {
        let context = RequestContext::guest("c1");
        let restaurant = Restaurant::new_from_request(&context, full_body());
        let record = restaurant.to_record().unwrap();
        assert!(Restaurant::validate_record(&record).is_ok());
        assert_eq!(
            record.get("status_").and_then(|v| v.as_str()),
            Some("new")
        );
        assert_eq!(record.get("archived"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn create_fails_without_title() {
        let context = RequestContext::guest("c1");
        let mut body = full_body();
        body.title = None;
        let restaurant = Restaurant::new_from_request(&context, body);
        let record = restaurant.to_record().unwrap();
        let error = Restaurant::validate_record(&record).unwrap_err();
        assert!(matches!(error, AppError::Validation(field) if field == "title"));
    }

    #[test]
    fn update_patch_never_contains_create_only_fields() {
        let context = RequestContext::guest("c1");
        let restaurant = Restaurant::update_from_request(
            &context,
            "r1",
            RestaurantBody {
                title: Some("New Name".to_owned()),
                ..RestaurantBody::default()
            },
        );
        let patch = restaurant.clean_update_patch().unwrap();
        assert!(patch.contains_key("title"));
        assert!(!patch.contains_key("id_"));
        assert!(!patch.contains_key("created_by"));
        assert!(!patch.contains_key("date_created"));
    }

    #[test]
    fn empty_delivery_address_is_rejected() {
        let context = RequestContext::guest("c1");
        let restaurant = Restaurant::new_from_request(&context, full_body());
        assert!(matches!(
            restaurant.delivery_price("  "),
            Err(AppError::InvalidAddress)
        ));
        assert_eq!(
            restaurant.delivery_price("Mayskiy lane, 2").unwrap(),
            Decimal::ZERO.round_dp(2)
        );
    }
}
