//! Shared fixtures for the integration tests: an in-memory gateway plus
//! seeded tenants, restaurants and menu items.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use restaurant_orderservice::auth::{Permissions, RequestContext, Role};
use restaurant_orderservice::entities::TableEntity;
use restaurant_orderservice::entities::menu_item::{MenuItem, MenuItemBody};
use restaurant_orderservice::entities::restaurant::{Restaurant, RestaurantBody};
use restaurant_orderservice::store::gateway::Gateway;
use restaurant_orderservice::store::memory::MemoryStore;

pub fn gateway() -> Gateway {
    Gateway::new(Arc::new(MemoryStore::new()))
}

pub fn admin_context(company_id: &str) -> RequestContext {
    RequestContext {
        company_id: company_id.to_owned(),
        user_id: "admin-1".to_owned(),
        role: Role::Admin,
        permissions: Permissions::default(),
    }
}

pub fn user_context(company_id: &str, user_id: &str) -> RequestContext {
    RequestContext {
        company_id: company_id.to_owned(),
        user_id: user_id.to_owned(),
        role: Role::User,
        permissions: Permissions::default(),
    }
}

pub async fn seed_restaurant(gateway: &Gateway, context: &RequestContext) -> String {
    let restaurant = Restaurant::new_from_request(
        context,
        RestaurantBody {
            title: Some("test restaurant title".to_owned()),
            address: Some("Time Square, New York".to_owned()),
            description: Some("This is my test restaurant".to_owned()),
            cuisine: Some(vec!["Chinese".to_owned()]),
            opening_time: Some(Decimal::from(10)),
            closing_time: Some(Decimal::from(23)),
            ..RestaurantBody::default()
        },
    );
    restaurant.create(gateway).await.expect("seed restaurant");
    restaurant.id
}

pub async fn seed_menu_item(
    gateway: &Gateway,
    context: &RequestContext,
    restaurant_id: &str,
    title: &str,
    price: &str,
) -> String {
    let item = MenuItem::new_from_request(
        context,
        restaurant_id,
        MenuItemBody {
            title: Some(title.to_owned()),
            category: Some("breakfast".to_owned()),
            description: Some(format!("{title} especially for breakfast")),
            price: Some(Decimal::from_str(price).expect("test price")),
            ..MenuItemBody::default()
        },
    );
    item.create(gateway).await.expect("seed menu item");
    item.id
}

pub async fn set_item_availability(
    gateway: &Gateway,
    context: &RequestContext,
    restaurant_id: &str,
    menu_item_id: &str,
    is_available: bool,
) {
    let patch = MenuItem::update_from_request(
        context,
        restaurant_id,
        menu_item_id,
        MenuItemBody {
            is_available: Some(is_available),
            ..MenuItemBody::default()
        },
    );
    patch.update(gateway).await.expect("set availability");
}
