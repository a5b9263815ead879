//! Menu items, scoped under one restaurant of a tenant.

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
pub struct MenuItem {
    #[serde(rename = "id_")]
    pub id: String,
    pub company_id: String,
    pub restaurant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
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
    field("category", Kind::Str, Mutability::Required),
    field("description", Kind::Str, Mutability::Required),
    field("price", Kind::Money, Mutability::Required),
    field("is_available", Kind::Bool, Mutability::Required),
    field("date_updated", Kind::Str, Mutability::Required),
    field("updated_by", Kind::Str, Mutability::Required),
    field("archived", Kind::Bool, Mutability::Required),
    field("opening_time", Kind::Whole, Mutability::Optional),
    field("closing_time", Kind::Whole, Mutability::Optional),
    field("weight", Kind::Whole, Mutability::Optional),
    field("options", Kind::List, Mutability::Optional),
];

impl TableEntity for MenuItem {
    const RECORD_TYPE: &'static str = "menu_item";

    fn schema() -> &'static [FieldSpec] {
        SCHEMA
    }

    fn primary_key(&self) -> RecordKey {
        keys::menu_item_key(&self.company_id, &self.restaurant_id, &self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MenuItemBody {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub opening_time: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub closing_time: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Decimal>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub options: Option<Vec<Value>>,
    pub is_available: Option<bool>,
}

impl MenuItem {
    pub fn new_from_request(
        context: &RequestContext,
        restaurant_id: &str,
        body: MenuItemBody,
    ) -> Self {
        let now = now_iso();
        Self {
            id: new_entity_id(),
            company_id: context.company_id.clone(),
            restaurant_id: restaurant_id.to_owned(),
            title: body.title,
            category: body.category,
            description: body.description,
            price: body.price.map(|p| p.round_dp(2)),
            opening_time: body.opening_time.map(|t| t.round_dp(0)),
            closing_time: body.closing_time.map(|t| t.round_dp(0)),
            weight: body.weight.map(|w| w.round_dp(0)),
            options: body.options,
            is_available: Some(body.is_available.unwrap_or(true)),
            created_by: Some(context.user_id.clone()),
            updated_by: Some(context.user_id.clone()),
            date_created: Some(now.clone()),
            date_updated: Some(now),
            archived: Some(false),
        }
    }

    pub fn update_from_request(
        context: &RequestContext,
        restaurant_id: &str,
        menu_item_id: &str,
        body: MenuItemBody,
    ) -> Self {
        Self {
            id: menu_item_id.to_owned(),
            company_id: context.company_id.clone(),
            restaurant_id: restaurant_id.to_owned(),
            title: body.title,
            category: body.category,
            description: body.description,
            price: body.price.map(|p| p.round_dp(2)),
            opening_time: body.opening_time.map(|t| t.round_dp(0)),
            closing_time: body.closing_time.map(|t| t.round_dp(0)),
            weight: body.weight.map(|w| w.round_dp(0)),
            options: body.options,
            is_available: body.is_available,
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
        menu_item_id: &str,
    ) -> Result<Self, AppError> {
        let record = gateway
            .get(&keys::menu_item_key(company_id, restaurant_id, menu_item_id))
            .await?;
        Self::from_record(record)
    }

    /// Non-archived items of one restaurant, in client shape.
    pub async fn list_for_restaurant(
        gateway: &Gateway,
        company_id: &str,
        restaurant_id: &str,
    ) -> Result<Vec<Record>, AppError> {
        let records = gateway
            .query_all(
                QueryRequest::partition(keys::menu_items_partition(company_id, restaurant_id))
                    .with_filter(FilterCondition::AttrEq("archived", Value::Bool(false))),
            )
            .await?;
        records
            .into_iter()
            .map(|record| Self::from_record(record)?.to_client())
            .collect()
    }

    pub async fn archive(
        gateway: &Gateway,
        context: &RequestContext,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> Result<(), AppError> {
        let mut item = Self::load(gateway, &context.company_id, restaurant_id, menu_item_id).await?;
        item.archived = Some(true);
        item.updated_by = Some(context.user_id.clone());
        item.date_updated = Some(now_iso());
        item.update(gateway).await
    }

    /// Whether the item can be ordered right now.
    // Todo: honour opening_time/closing_time once the storefront sends a
    // timezone; for now availability collapses to the stored flag.
    pub fn is_available_now(&self) -> bool {
        self.is_available.unwrap_or(false)
    }
}
