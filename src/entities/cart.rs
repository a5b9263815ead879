//! Carts: one active cart per (tenant, user).
//!
//! The cart is bound to a single restaurant. Adding an item from a different
//! restaurant resets the cart to that restaurant; there are no mixed carts.
//! After every mutation the line items are re-validated against the menu and
//! unavailable ones are dropped, with a notice surfaced to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::app_error::AppError;
use crate::entities::menu_item::MenuItem;
use crate::entities::{FieldSpec, Kind, Mutability, TableEntity, field};
use crate::keys;
use crate::store::RecordKey;
use crate::store::gateway::Gateway;

pub const ITEMS_REMOVED_NOTICE: &str =
    "Some items are no longer available and were removed from your cart";

/// One cart line: the menu item and how many of it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: String,
    pub qty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub company_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub menu_items: BTreeMap<String, CartLine>,
}

const SCHEMA: &[FieldSpec] = &[
    field("user_id", Kind::Str, Mutability::CreateOnly),
    field("restaurant_id", Kind::Str, Mutability::Required),
    field("menu_items", Kind::Map, Mutability::Required),
    field("delivery_address", Kind::Str, Mutability::Optional),
];

impl TableEntity for Cart {
    const RECORD_TYPE: &'static str = "cart";

    fn schema() -> &'static [FieldSpec] {
        SCHEMA
    }

    fn primary_key(&self) -> RecordKey {
        keys::cart_key(&self.company_id, &self.user_id)
    }
}

impl Cart {
    fn empty(company_id: &str, user_id: &str) -> Self {
        Self {
            company_id: company_id.to_owned(),
            user_id: user_id.to_owned(),
            restaurant_id: None,
            delivery_address: None,
            menu_items: BTreeMap::new(),
        }
    }

    /// Load the user's cart; absence is a valid state meaning "no cart yet".
    pub async fn load_or_default(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
    ) -> Result<Self, AppError> {
        match gateway.get(&keys::cart_key(company_id, user_id)).await {
            Ok(record) => Self::from_record(record),
            Err(AppError::NotFound) => Ok(Self::empty(company_id, user_id)),
            Err(error) => Err(error),
        }
    }

    /// Add one unit of a menu item. Switching restaurants wipes the previous
    /// lines first. Returns the cart and a notice when unavailable lines were
    /// dropped along the way.
    pub async fn add_item(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> Result<(Self, Option<&'static str>), AppError> {
        let mut cart = Self::load_or_default(gateway, company_id, user_id).await?;

        if cart.restaurant_id.as_deref() != Some(restaurant_id) {
            cart.restaurant_id = Some(restaurant_id.to_owned());
            cart.menu_items.clear();
            cart.create(gateway).await?;
        }

        cart.menu_items
            .entry(menu_item_id.to_owned())
            .and_modify(|line| line.qty += 1)
            .or_insert_with(|| CartLine {
                id: menu_item_id.to_owned(),
                qty: 1,
            });

        let all_available = cart.drop_unavailable_items(gateway).await?;
        cart.update(gateway).await?;
        Ok((cart, (!all_available).then_some(ITEMS_REMOVED_NOTICE)))
    }

    /// Remove a line entirely, then re-validate what is left.
    pub async fn remove_item(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
        menu_item_id: &str,
    ) -> Result<(Self, Option<&'static str>), AppError> {
        let mut cart = Self::load_or_default(gateway, company_id, user_id).await?;
        cart.menu_items.remove(menu_item_id);
        let all_available = cart.drop_unavailable_items(gateway).await?;
        cart.update(gateway).await?;
        Ok((cart, (!all_available).then_some(ITEMS_REMOVED_NOTICE)))
    }

    /// Delete the cart record wholesale (explicit clear, or order placement).
    pub async fn delete(
        gateway: &Gateway,
        company_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        gateway.delete(&keys::cart_key(company_id, user_id)).await?;
        tracing::info!(user_id, "cart cleared");
        Ok(())
    }

    /// Drop lines whose menu item is no longer orderable. Returns whether the
    /// cart survived intact.
    async fn drop_unavailable_items(&mut self, gateway: &Gateway) -> Result<bool, AppError> {
        let Some(restaurant_id) = self.restaurant_id.clone() else {
            return Ok(true);
        };
        let before = self.menu_items.len();
        let mut available = BTreeMap::new();
        for (item_id, line) in std::mem::take(&mut self.menu_items) {
            let item =
                MenuItem::load(gateway, &self.company_id, &restaurant_id, &item_id).await?;
            if item.is_available_now() {
                available.insert(item_id, line);
            } else {
                tracing::info!(%item_id, "dropping unavailable item from cart");
            }
        }
        self.menu_items = available;
        Ok(self.menu_items.len() == before)
    }
}
