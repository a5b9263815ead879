mod support;

use restaurant_orderservice::entities::cart::{Cart, ITEMS_REMOVED_NOTICE};

use support::{admin_context, gateway, seed_menu_item, seed_restaurant, set_item_availability};

const COMPANY: &str = "c-cart";
const CUSTOMER: &str = "customer-1";

#[tokio::test]
async fn adding_items_accumulates_quantities() {
    let gateway = gateway();
    let admin = admin_context(COMPANY);
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let eggs = seed_menu_item(&gateway, &admin, &restaurant_id, "Scrambled eggs", "9.99").await;

    Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &eggs)
        .await
        .unwrap();
    let (cart, notice) = Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &eggs)
        .await
        .unwrap();

    assert!(notice.is_none());
    assert_eq!(cart.restaurant_id.as_deref(), Some(restaurant_id.as_str()));
    assert_eq!(cart.menu_items[&eggs].qty, 2);
}

#[tokio::test]
async fn switching_restaurants_resets_the_cart() {
    let gateway = gateway();
    let admin = admin_context(COMPANY);
    let restaurant_a = seed_restaurant(&gateway, &admin).await;
    let restaurant_b = seed_restaurant(&gateway, &admin).await;
    let item_a = seed_menu_item(&gateway, &admin, &restaurant_a, "Burger", "18.50").await;
    let item_b = seed_menu_item(&gateway, &admin, &restaurant_b, "Ramen", "12.00").await;

    Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_a, &item_a)
        .await
        .unwrap();
    let (cart, _) = Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_b, &item_b)
        .await
        .unwrap();

    assert_eq!(cart.restaurant_id.as_deref(), Some(restaurant_b.as_str()));
    assert_eq!(cart.menu_items.len(), 1);
    assert!(cart.menu_items.contains_key(&item_b));
    assert!(!cart.menu_items.contains_key(&item_a));

    // The reset cart is what got persisted, too.
    let reloaded = Cart::load_or_default(&gateway, COMPANY, CUSTOMER)
        .await
        .unwrap();
    assert_eq!(reloaded.restaurant_id.as_deref(), Some(restaurant_b.as_str()));
    assert_eq!(reloaded.menu_items.len(), 1);
}

#[tokio::test]
async fn unavailable_items_are_dropped_with_a_notice() {
    let gateway = gateway();
    let admin = admin_context(COMPANY);
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let eggs = seed_menu_item(&gateway, &admin, &restaurant_id, "Scrambled eggs", "9.99").await;
    let burger = seed_menu_item(&gateway, &admin, &restaurant_id, "Burger", "18.50").await;

    Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &eggs)
        .await
        .unwrap();
    set_item_availability(&gateway, &admin, &restaurant_id, &eggs, false).await;

    let (cart, notice) = Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &burger)
        .await
        .unwrap();

    assert_eq!(notice, Some(ITEMS_REMOVED_NOTICE));
    assert!(!cart.menu_items.contains_key(&eggs));
    assert!(cart.menu_items.contains_key(&burger));
}

#[tokio::test]
async fn an_all_available_cart_produces_no_notice() {
    let gateway = gateway();
    let admin = admin_context(COMPANY);
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let eggs = seed_menu_item(&gateway, &admin, &restaurant_id, "Scrambled eggs", "9.99").await;
    let burger = seed_menu_item(&gateway, &admin, &restaurant_id, "Burger", "18.50").await;

    Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &eggs)
        .await
        .unwrap();
    let (_, notice) = Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &burger)
        .await
        .unwrap();
    assert!(notice.is_none());
}

#[tokio::test]
async fn removing_a_line_and_clearing_the_cart() {
    let gateway = gateway();
    let admin = admin_context(COMPANY);
    let restaurant_id = seed_restaurant(&gateway, &admin).await;
    let eggs = seed_menu_item(&gateway, &admin, &restaurant_id, "Scrambled eggs", "9.99").await;
    let burger = seed_menu_item(&gateway, &admin, &restaurant_id, "Burger", "18.50").await;

    Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &eggs)
        .await
        .unwrap();
    Cart::add_item(&gateway, COMPANY, CUSTOMER, &restaurant_id, &burger)
        .await
        .unwrap();

    let (cart, _) = Cart::remove_item(&gateway, COMPANY, CUSTOMER, &eggs)
        .await
        .unwrap();
    assert_eq!(cart.menu_items.len(), 1);

    Cart::delete(&gateway, COMPANY, CUSTOMER).await.unwrap();
    let cart = Cart::load_or_default(&gateway, COMPANY, CUSTOMER)
        .await
        .unwrap();
    assert!(cart.menu_items.is_empty());
    assert!(cart.restaurant_id.is_none());
}
