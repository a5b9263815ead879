//! Pre-orders and orders.
//!
//! A pre-order is an ephemeral, TTL-bound snapshot of a prospective order:
//! item lines with their price at draft time plus the server-computed amount.
//! Promotion turns it into a durable order record carrying a secondary-index
//! projection for user-scoped lookup, and clears the authenticated user's
//! cart. The pre-order itself is left to expire — promotion stays a single
//! additional write.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::RequestContext;
use crate::core::app_error::AppError;
use crate::entities::cart::Cart;
use crate::entities::menu_item::MenuItem;
use crate::entities::restaurant::Restaurant;
use crate::entities::{
    FieldSpec, Kind, Mutability, TableEntity, UNAUTHORIZED_USER, field, new_order_id, now_iso,
    ttl_in_hours,
};
use crate::keys;
use crate::store::gateway::Gateway;
use crate::store::{
    ATTR_GSI_USER_ORDERS_PARTKEY, ATTR_GSI_USER_ORDERS_SORTKEY, FilterCondition, QueryRequest,
    Record, RecordKey, decode_cursor, encode_cursor,
};

/// Pre-orders expire a day after drafting.
const PRE_ORDER_TTL_HOURS: i64 = 24;

/// Snapshot of one ordered line at draft time. The price is frozen here so
/// later menu edits cannot change what the customer agreed to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub qty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreOrder {
    #[serde(rename = "id_")]
    pub id: String,
    pub company_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub restaurant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(
        rename = "comment_",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub date_created: String,
    #[serde(rename = "ttl_")]
    pub ttl: i64,
}

const PRE_ORDER_SCHEMA: &[FieldSpec] = &[
    field("id_", Kind::Str, Mutability::CreateOnly),
    field("user_id", Kind::Str, Mutability::CreateOnly),
    field("user_phone_number", Kind::Str, Mutability::CreateOnly),
    field("restaurant_id", Kind::Str, Mutability::CreateOnly),
    field("delivery_address", Kind::Str, Mutability::CreateOnly),
    field("date_created", Kind::Str, Mutability::CreateOnly),
    field("items", Kind::List, Mutability::Required),
    field("amount", Kind::Money, Mutability::Required),
    field("archived", Kind::Bool, Mutability::Required),
    field("user_email", Kind::Str, Mutability::Optional),
    field("comment_", Kind::Str, Mutability::Optional),
];

impl TableEntity for PreOrder {
    const RECORD_TYPE: &'static str = "pre_order";

    fn schema() -> &'static [FieldSpec] {
        PRE_ORDER_SCHEMA
    }

    fn primary_key(&self) -> RecordKey {
        keys::pre_order_key(&self.company_id, &self.user_id, &self.id)
    }
}

/// Checkout details shared by the authenticated and guest draft endpoints.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DraftPreOrderBody {
    pub user_phone_number: Option<String>,
    pub user_email: Option<String>,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GuestOrderLine {
    pub id: String,
    pub qty: Option<u32>,
}

/// Guest checkout: no cart exists, the items come with the request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GuestPreOrderBody {
    pub user_phone_number: Option<String>,
    pub user_email: Option<String>,
    pub restaurant_id: String,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub items: Vec<GuestOrderLine>,
}

impl PreOrder {
    /// Draft from the authenticated user's cart.
    pub async fn draft_from_cart(
        gateway: &Gateway,
        context: &RequestContext,
        body: DraftPreOrderBody,
    ) -> Result<Self, AppError> {
        let cart = Cart::load_or_default(gateway, &context.company_id, &context.user_id).await?;
        let restaurant_id = cart
            .restaurant_id
            .clone()
            .filter(|_| !cart.menu_items.is_empty())
            .ok_or_else(|| AppError::BadRequest("cart is empty, nothing to order".to_owned()))?;
        let lines = cart
            .menu_items
            .values()
            .map(|line| (line.id.clone(), line.qty))
            .collect();
        Self::draft(
            gateway,
            &context.company_id,
            &context.user_id,
            &restaurant_id,
            lines,
            body,
        )
        .await
    }

    /// Draft for an unauthenticated customer from an explicit item list.
    pub async fn draft_from_items(
        gateway: &Gateway,
        company_id: &str,
        body: GuestPreOrderBody,
    ) -> Result<Self, AppError> {
        let lines: Vec<(String, u32)> = body
            .items
            .iter()
            .map(|line| (line.id.clone(), line.qty.unwrap_or(1)))
            .filter(|(_, qty)| *qty > 0)
            .collect();
        let details = DraftPreOrderBody {
            user_phone_number: body.user_phone_number,
            user_email: body.user_email,
            delivery_address: body.delivery_address,
            comment: body.comment,
        };
        Self::draft(
            gateway,
            company_id,
            UNAUTHORIZED_USER,
            &body.restaurant_id,
            lines,
            details,
        )
        .await
    }

    async fn draft(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
        restaurant_id: &str,
        lines: Vec<(String, u32)>,
        body: DraftPreOrderBody,
    ) -> Result<Self, AppError> {
        if lines.is_empty() {
            return Err(AppError::BadRequest(
                "order must contain at least one item".to_owned(),
            ));
        }

        let items = snapshot_lines(gateway, company_id, restaurant_id, &lines).await?;
        check_items_availability(gateway, company_id, restaurant_id, &items).await?;

        let restaurant = Restaurant::load(gateway, company_id, restaurant_id).await?;
        let delivery_address = body.delivery_address.unwrap_or_default();
        let delivery_price = restaurant.delivery_price(&delivery_address)?;
        let amount = compute_amount(&items, delivery_price);

        let pre_order = Self {
            id: new_order_id(),
            company_id: company_id.to_owned(),
            user_id: user_id.to_owned(),
            user_phone_number: body.user_phone_number,
            user_email: body.user_email,
            restaurant_id: restaurant_id.to_owned(),
            delivery_address: Some(delivery_address),
            items,
            amount: Some(amount),
            comment: body.comment,
            archived: false,
            date_created: now_iso(),
            ttl: ttl_in_hours(PRE_ORDER_TTL_HOURS),
        };
        pre_order.create(gateway).await?;
        Ok(pre_order)
    }

    /// Reload a drafted pre-order. Absence — never drafted or already evicted
    /// by TTL — reads as `OrderNotFound`.
    pub async fn load(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
        pre_order_id: &str,
    ) -> Result<Self, AppError> {
        let record = gateway
            .get(&keys::pre_order_key(company_id, user_id, pre_order_id))
            .await
            .map_err(|error| match error {
                AppError::NotFound => AppError::OrderNotFound,
                other => other,
            })?;
        Self::from_record(record)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "id_")]
    pub id: String,
    pub company_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub restaurant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<String>>,
    #[serde(
        rename = "comment_",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

const ORDER_SCHEMA: &[FieldSpec] = &[
    field("id_", Kind::Str, Mutability::CreateOnly),
    field("user_id", Kind::Str, Mutability::CreateOnly),
    field("user_phone_number", Kind::Str, Mutability::CreateOnly),
    field("restaurant_id", Kind::Str, Mutability::CreateOnly),
    field("delivery_address", Kind::Str, Mutability::CreateOnly),
    field("date_created", Kind::Str, Mutability::CreateOnly),
    field("paid", Kind::Bool, Mutability::CreateOnly),
    field("items", Kind::List, Mutability::Required),
    field("amount", Kind::Money, Mutability::Required),
    field("date_updated", Kind::Str, Mutability::Required),
    field("updated_by", Kind::Str, Mutability::Required),
    field("archived", Kind::Bool, Mutability::Required),
    field("user_email", Kind::Str, Mutability::Optional),
    field("comment_", Kind::Str, Mutability::Optional),
    field("feedback", Kind::Str, Mutability::Optional),
    field("feedback_rate", Kind::Rating, Mutability::Optional),
    field("history", Kind::List, Mutability::Optional),
];

impl TableEntity for Order {
    const RECORD_TYPE: &'static str = "order";

    fn schema() -> &'static [FieldSpec] {
        ORDER_SCHEMA
    }

    fn primary_key(&self) -> RecordKey {
        keys::order_key(&self.company_id, &self.restaurant_id, &self.id)
    }

    /// The user-scoped index key pair, written atomically with the record.
    fn index_projection(&self) -> Record {
        let index_key = keys::user_orders_key(
            &self.company_id,
            &self.user_id,
            &self.restaurant_id,
            &self.id,
        );
        let mut projection = Record::new();
        projection.insert(
            ATTR_GSI_USER_ORDERS_PARTKEY.to_owned(),
            Value::String(index_key.partkey),
        );
        projection.insert(
            ATTR_GSI_USER_ORDERS_SORTKEY.to_owned(),
            Value::String(index_key.sortkey),
        );
        projection
    }
}

/// Staff-updatable order fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateOrderBody {
    pub history: Option<Vec<String>>,
    pub feedback: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub feedback_rate: Option<Decimal>,
    pub comment: Option<String>,
}

impl Order {
    /// Promote a drafted pre-order into an order.
    ///
    /// Availability is re-checked — prices and stock may have moved since
    /// drafting — the creation timestamp is regenerated, and the
    /// authenticated user's cart is deleted. The pre-order stays behind; its
    /// TTL retires it. The cart deletion is a dependent write with no
    /// transaction around it: if it fails the order stands and the stale cart
    /// is logged for manual clearing.
    pub async fn create_from_pre_order(
        gateway: &Gateway,
        context: &RequestContext,
        pre_order_id: &str,
    ) -> Result<Self, AppError> {
        let pre_order =
            PreOrder::load(gateway, &context.company_id, &context.user_id, pre_order_id).await?;
        check_items_availability(
            gateway,
            &context.company_id,
            &pre_order.restaurant_id,
            &pre_order.items,
        )
        .await?;

        let now = now_iso();
        let order = Self {
            id: pre_order.id,
            company_id: pre_order.company_id,
            user_id: pre_order.user_id,
            user_phone_number: pre_order.user_phone_number,
            user_email: pre_order.user_email,
            restaurant_id: pre_order.restaurant_id,
            delivery_address: pre_order.delivery_address,
            items: pre_order.items,
            amount: pre_order.amount,
            paid: false,
            history: Some(vec!["created".to_owned()]),
            comment: pre_order.comment,
            feedback: None,
            feedback_rate: None,
            updated_by: Some(context.user_id.clone()),
            date_created: Some(now.clone()),
            date_updated: Some(now),
            archived: false,
        };
        order.create(gateway).await?;

        if !context.is_guest() {
            if let Err(error) =
                Cart::delete(gateway, &context.company_id, &context.user_id).await
            {
                tracing::error!(
                    user_id = %context.user_id,
                    %error,
                    "order created but cart deletion failed, stale cart left behind"
                );
            }
        }
        Ok(order)
    }

    /// Load one order by its primary key. Ownership is checked after the
    /// load — the primary key carries no user id — and staff are exempt.
    pub async fn get_by_id(
        gateway: &Gateway,
        context: &RequestContext,
        restaurant_id: &str,
        order_id: &str,
    ) -> Result<Self, AppError> {
        let record = gateway
            .get(&keys::order_key(&context.company_id, restaurant_id, order_id))
            .await
            .map_err(|error| match error {
                AppError::NotFound => AppError::OrderNotFound,
                other => other,
            })?;
        let order = Self::from_record(record)?;
        if !context.is_staff() && order.user_id != context.user_id {
            return Err(AppError::AccessDenied);
        }
        Ok(order)
    }

    /// All of a user's non-archived orders across restaurants, resolved
    /// through the user-scoped index projection rather than a table scan.
    pub async fn list_for_user(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
    ) -> Result<Vec<Record>, AppError> {
        let records = gateway
            .query_all(
                QueryRequest::partition(keys::user_orders_partition(company_id, user_id))
                    .on_index(crate::store::GSI_USER_ORDERS)
                    .with_filter(FilterCondition::AttrEq("archived", Value::Bool(false))),
            )
            .await?;
        records
            .into_iter()
            .map(|record| Self::from_record(record)?.to_client())
            .collect()
    }

    /// One page of a restaurant's non-archived orders. The caller passes the
    /// cursor back verbatim to resume.
    pub async fn list_for_restaurant(
        gateway: &Gateway,
        context: &RequestContext,
        restaurant_id: &str,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<(Vec<Record>, Option<String>), AppError> {
        context.require_restaurant_access(restaurant_id)?;
        let start_key = cursor.map(decode_cursor).transpose()?;
        let page = gateway
            .query_page(
                QueryRequest::partition(keys::orders_partition(&context.company_id))
                    .with_sort_key_prefix(keys::orders_sort_prefix(restaurant_id))
                    .with_filter(FilterCondition::AttrEq("archived", Value::Bool(false)))
                    .with_limit(limit.unwrap_or(50))
                    .with_start_key(start_key),
            )
            .await?;
        let items = page
            .items
            .into_iter()
            .map(|record| Self::from_record(record)?.to_client())
            .collect::<Result<Vec<_>, _>>()?;
        let next_cursor = page.last_key.map(|key| encode_cursor(&key)).transpose()?;
        Ok((items, next_cursor))
    }

    /// Staff update of the whitelisted post-creation fields.
    pub async fn update_by_staff(
        gateway: &Gateway,
        context: &RequestContext,
        restaurant_id: &str,
        order_id: &str,
        body: UpdateOrderBody,
    ) -> Result<(), AppError> {
        context.require_restaurant_access(restaurant_id)?;
        let mut order = Self::get_by_id(gateway, context, restaurant_id, order_id).await?;
        if let Some(history) = body.history {
            order.history = Some(history);
        }
        if let Some(feedback) = body.feedback {
            order.feedback = Some(feedback);
        }
        if let Some(feedback_rate) = body.feedback_rate {
            order.feedback_rate = Some(feedback_rate);
        }
        if let Some(comment) = body.comment {
            order.comment = Some(comment);
        }
        order.updated_by = Some(context.user_id.clone());
        order.date_updated = Some(now_iso());
        order.update(gateway).await
    }

    /// Archive an order: owners their own, staff any. Soft delete only.
    pub async fn archive(
        gateway: &Gateway,
        context: &RequestContext,
        restaurant_id: &str,
        order_id: &str,
    ) -> Result<(), AppError> {
        let mut order = Self::get_by_id(gateway, context, restaurant_id, order_id).await?;
        order.archived = true;
        order.updated_by = Some(context.user_id.clone());
        order.date_updated = Some(now_iso());
        order.update(gateway).await
    }
}

/// Freeze the current menu prices into order lines.
async fn snapshot_lines(
    gateway: &Gateway,
    company_id: &str,
    restaurant_id: &str,
    lines: &[(String, u32)],
) -> Result<Vec<OrderLine>, AppError> {
    let mut items = Vec::with_capacity(lines.len());
    for (item_id, qty) in lines {
        let item = MenuItem::load(gateway, company_id, restaurant_id, item_id).await?;
        let price = item
            .price
            .ok_or_else(|| AppError::Validation("price".to_owned()))?;
        items.push(OrderLine {
            id: item.id,
            title: item.title,
            price,
            qty: *qty,
        });
    }
    Ok(items)
}

/// Every line must still be orderable right now.
async fn check_items_availability(
    gateway: &Gateway,
    company_id: &str,
    restaurant_id: &str,
    lines: &[OrderLine],
) -> Result<(), AppError> {
    for line in lines {
        let item = MenuItem::load(gateway, company_id, restaurant_id, &line.id).await?;
        if !item.is_available_now() {
            tracing::warn!(item_id = %line.id, "item no longer available");
            return Err(AppError::SomeItemsUnavailable);
        }
    }
    Ok(())
}

/// Σ(unit price × qty) + delivery, quantized to currency precision.
fn compute_amount(lines: &[OrderLine], delivery_price: Decimal) -> Decimal {
    let items_total: Decimal = lines
        .iter()
        .map(|line| line.price * Decimal::from(line.qty))
        .sum();
    (items_total + delivery_price).round_dp(2)
}
