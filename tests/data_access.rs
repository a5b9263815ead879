mod support;

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;

use restaurant_orderservice::entities::menu_item::MenuItem;
use restaurant_orderservice::entities::order::{Order, OrderLine};
use restaurant_orderservice::entities::restaurant::Restaurant;
use restaurant_orderservice::entities::{TableEntity, now_iso, to_client_shape, to_storage_shape};
use restaurant_orderservice::keys;
use restaurant_orderservice::store::Record;

use support::{admin_context, gateway, seed_menu_item, seed_restaurant, user_context};

#[tokio::test]
async fn tenant_partitions_never_leak_across_companies() {
    let gateway = gateway();
    let admin_one = admin_context("tenant-1");
    let admin_two = admin_context("tenant-2");

    // The same logical restaurant id reused under both tenants.
    let shared_restaurant = "r-shared";
    let item_one =
        seed_menu_item(&gateway, &admin_one, shared_restaurant, "Eggs", "9.99").await;
    let item_two =
        seed_menu_item(&gateway, &admin_two, shared_restaurant, "Eggs", "1.99").await;

    let listed_one =
        MenuItem::list_for_restaurant(&gateway, "tenant-1", shared_restaurant)
            .await
            .unwrap();
    assert_eq!(listed_one.len(), 1);
    assert_eq!(
        listed_one[0].get("id").and_then(|v| v.as_str()),
        Some(item_one.as_str())
    );

    let listed_two =
        MenuItem::list_for_restaurant(&gateway, "tenant-2", shared_restaurant)
            .await
            .unwrap();
    assert_eq!(listed_two.len(), 1);
    assert_eq!(
        listed_two[0].get("id").and_then(|v| v.as_str()),
        Some(item_two.as_str())
    );
}

#[tokio::test]
async fn archived_records_leave_listings_but_stay_fetchable() {
    let gateway = gateway();
    let admin = admin_context("tenant-3");
    let keep = seed_restaurant(&gateway, &admin).await;
    let archive = seed_restaurant(&gateway, &admin).await;

    Restaurant::archive(&gateway, &admin, &archive).await.unwrap();

    let listed = Restaurant::list_active(&gateway, "tenant-3").await.unwrap();
    let listed_ids: Vec<&str> = listed
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_str()))
        .collect();
    assert!(listed_ids.contains(&keep.as_str()));
    assert!(!listed_ids.contains(&archive.as_str()));

    // Soft delete: the record itself is still there.
    let archived = Restaurant::load(&gateway, "tenant-3", &archive).await.unwrap();
    assert_eq!(archived.archived, Some(true));
}

#[tokio::test]
async fn updates_only_touch_whitelisted_fields() {
    let gateway = gateway();
    let admin = admin_context("tenant-4");
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let item_id = seed_menu_item(&gateway, &admin, &restaurant_id, "Eggs", "9.99").await;
    let key = keys::menu_item_key("tenant-4", &restaurant_id, &item_id);

    let mut patch = Record::new();
    patch.insert("title".to_owned(), json!("Deluxe eggs"));
    patch.insert("created_by".to_owned(), json!("intruder"));

    gateway
        .update(&key, patch, &MenuItem::update_whitelist(), &[])
        .await
        .unwrap();

    let record = gateway.get(&key).await.unwrap();
    assert_eq!(record.get("title"), Some(&json!("Deluxe eggs")));
    assert_eq!(record.get("created_by"), Some(&json!("admin-1")));
}

#[tokio::test]
async fn invalid_update_values_are_dropped_not_rejected() {
    let gateway = gateway();
    let admin = admin_context("tenant-5");
    let restaurant_id = seed_restaurant(&gateway, &admin).await;

    let order = sample_order("tenant-5", &restaurant_id, "customer", "o-1");
    order.create(&gateway).await.unwrap();

    // A rating outside 1..=5 fails its shape check and falls out of the
    // patch; the feedback text still lands.
    let mut carrier = order.clone();
    carrier.feedback = Some("great".to_owned());
    carrier.feedback_rate = Some(Decimal::from(7));
    let patch = carrier.clean_update_patch().unwrap();
    assert!(patch.contains_key("feedback"));
    assert!(!patch.contains_key("feedback_rate"));
}

#[tokio::test]
async fn client_and_storage_shapes_round_trip() {
    let gateway = gateway();
    let admin = admin_context("tenant-6");
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let restaurant = Restaurant::load(&gateway, "tenant-6", &restaurant_id)
        .await
        .unwrap();

    let storage = restaurant.to_record().unwrap();
    let round_tripped = to_storage_shape(to_client_shape(storage.clone()));

    for spec in Restaurant::schema() {
        assert_eq!(
            round_tripped.get(spec.name),
            storage.get(spec.name),
            "field {} lost in round trip",
            spec.name
        );
    }
}

#[tokio::test]
async fn restaurant_order_listing_paginates_with_opaque_cursors() {
    let gateway = gateway();
    let admin = admin_context("tenant-7");
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let other_restaurant = seed_restaurant(&gateway, &admin).await;

    for n in 0..5 {
        sample_order("tenant-7", &restaurant_id, "customer", &format!("o-{n}"))
            .create(&gateway)
            .await
            .unwrap();
    }
    // An order of a different restaurant in the same tenant partition must
    // never show up under this restaurant's prefix.
    sample_order("tenant-7", &other_restaurant, "customer", "o-other")
        .create(&gateway)
        .await
        .unwrap();

    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    loop {
        let (page, next) = Order::list_for_restaurant(
            &gateway,
            &admin,
            &restaurant_id,
            Some(2),
            cursor.as_deref(),
        )
        .await
        .unwrap();
        assert!(page.len() <= 2);
        for order in &page {
            let id = order.get("id").and_then(|v| v.as_str()).unwrap().to_owned();
            assert!(seen.insert(id), "duplicate order across pages");
        }
        match next {
            Some(next_cursor) => cursor = Some(next_cursor),
            None => break,
        }
    }
    assert_eq!(seen.len(), 5);
    assert!(!seen.contains("o-other"));
}

#[tokio::test]
async fn user_scoped_order_listing_uses_the_index_projection() {
    let gateway = gateway();
    let admin = admin_context("tenant-8");
    let restaurant_a = seed_restaurant(&gateway, &admin).await;
    let restaurant_b = seed_restaurant(&gateway, &admin).await;

    sample_order("tenant-8", &restaurant_a, "customer-x", "o-a")
        .create(&gateway)
        .await
        .unwrap();
    sample_order("tenant-8", &restaurant_b, "customer-x", "o-b")
        .create(&gateway)
        .await
        .unwrap();
    sample_order("tenant-8", &restaurant_a, "customer-y", "o-c")
        .create(&gateway)
        .await
        .unwrap();

    let orders = Order::list_for_user(&gateway, "tenant-8", "customer-x")
        .await
        .unwrap();
    let ids: Vec<&str> = orders
        .iter()
        .filter_map(|o| o.get("id").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"o-a"));
    assert!(ids.contains(&"o-b"));

    // Archiving removes it from the listing.
    let customer = user_context("tenant-8", "customer-x");
    Order::archive(&gateway, &customer, &restaurant_a, "o-a")
        .await
        .unwrap();
    let orders = Order::list_for_user(&gateway, "tenant-8", "customer-x")
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
}

fn sample_order(company_id: &str, restaurant_id: &str, user_id: &str, order_id: &str) -> Order {
    Order {
        id: order_id.to_owned(),
        company_id: company_id.to_owned(),
        user_id: user_id.to_owned(),
        user_phone_number: Some("+15550100".to_owned()),
        user_email: None,
        restaurant_id: restaurant_id.to_owned(),
        delivery_address: Some("Mayskiy lane, 2".to_owned()),
        items: vec![OrderLine {
            id: "item".to_owned(),
            title: Some("Eggs".to_owned()),
            price: Decimal::from_str("9.99").unwrap(),
            qty: 1,
        }],
        amount: Some(Decimal::from_str("9.99").unwrap()),
        paid: false,
        history: Some(vec!["created".to_owned()]),
        comment: None,
        feedback: None,
        feedback_rate: None,
        updated_by: Some(user_id.to_owned()),
        date_created: Some(now_iso()),
        date_updated: Some(now_iso()),
        archived: false,
    }
}
