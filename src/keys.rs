//! Key composition for every record type in the single table.
//!
//! Partition key composition is the sole tenant-isolation mechanism: every
//! template below embeds the `company_id`, and no query-time filter enforces
//! tenant boundaries. Type-specific prefixes keep the templates collision-free
//! across record types. Any change here must update every consumer at once —
//! there is no schema version field — which is why this is the only module
//! allowed to build keys.

use crate::store::RecordKey;

pub fn users_partition(company_id: &str) -> String {
    format!("users_{company_id}")
}

pub fn user_key(company_id: &str, user_id: &str) -> RecordKey {
    RecordKey::new(users_partition(company_id), user_id)
}

pub fn restaurants_partition(company_id: &str) -> String {
    format!("restaurants_{company_id}")
}

pub fn restaurant_key(company_id: &str, restaurant_id: &str) -> RecordKey {
    RecordKey::new(restaurants_partition(company_id), restaurant_id)
}

pub fn menu_items_partition(company_id: &str, restaurant_id: &str) -> String {
    format!("menu_items_{company_id}_{restaurant_id}")
}

pub fn menu_item_key(company_id: &str, restaurant_id: &str, menu_item_id: &str) -> RecordKey {
    RecordKey::new(menu_items_partition(company_id, restaurant_id), menu_item_id)
}

pub fn cart_key(company_id: &str, user_id: &str) -> RecordKey {
    RecordKey::new(format!("carts_{company_id}"), user_id)
}

pub fn pre_order_key(company_id: &str, user_id: &str, order_id: &str) -> RecordKey {
    RecordKey::new(format!("pre_order_{company_id}_{user_id}"), order_id)
}

pub fn orders_partition(company_id: &str) -> String {
    format!("orders_{company_id}")
}

pub fn order_key(company_id: &str, restaurant_id: &str, order_id: &str) -> RecordKey {
    RecordKey::new(
        orders_partition(company_id),
        format!("{restaurant_id}_{order_id}"),
    )
}

/// Sort-key prefix selecting one restaurant's orders within the tenant
/// partition.
pub fn orders_sort_prefix(restaurant_id: &str) -> String {
    format!("{restaurant_id}_")
}

pub fn user_orders_partition(company_id: &str, user_id: &str) -> String {
    format!("orders_{company_id}_{user_id}")
}

/// Secondary-index key pair projected onto every order record, derivable from
/// the same identifiers as the primary key.
pub fn user_orders_key(
    company_id: &str,
    user_id: &str,
    restaurant_id: &str,
    order_id: &str,
) -> RecordKey {
    RecordKey::new(
        user_orders_partition(company_id, user_id),
        format!("{restaurant_id}_{order_id}"),
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    /// Reusing the same logical ids under two tenants must never produce the
    /// same partition.
    #[rstest]
    #[case(users_partition("c1"), users_partition("c2"))]
    #[case(restaurants_partition("c1"), restaurants_partition("c2"))]
    #[case(menu_items_partition("c1", "r1"), menu_items_partition("c2", "r1"))]
    #[case(cart_key("c1", "u1").partkey, cart_key("c2", "u1").partkey)]
    #[case(
        pre_order_key("c1", "u1", "o1").partkey,
        pre_order_key("c2", "u1", "o1").partkey
    )]
    #[case(orders_partition("c1"), orders_partition("c2"))]
    #[case(
        user_orders_partition("c1", "u1"),
        user_orders_partition("c2", "u1")
    )]
    fn tenant_partitions_are_disjoint(#[case] first: String, #[case] second: String) {
        assert_ne!(first, second);
    }

    #[test]
    fn record_type_prefixes_keep_partitions_distinct() {
        let partitions = [
            users_partition("c1"),
            restaurants_partition("c1"),
            menu_items_partition("c1", "r1"),
            cart_key("c1", "u1").partkey,
            pre_order_key("c1", "u1", "o1").partkey,
            orders_partition("c1"),
        ];
        for (i, a) in partitions.iter().enumerate() {
            for b in partitions.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn order_index_key_is_derivable_from_primary_identifiers() {
        let primary = order_key("c1", "r1", "o1");
        let index = user_orders_key("c1", "u1", "r1", "o1");
        assert_eq!(primary.sortkey, index.sortkey);
        assert_eq!(index.partkey, "orders_c1_u1");
    }

    #[test]
    fn restaurant_prefix_selects_only_that_restaurant() {
        let key = order_key("c1", "r1", "o1");
        assert!(key.sortkey.starts_with(&orders_sort_prefix("r1")));
        assert!(!key.sortkey.starts_with(&orders_sort_prefix("r2")));
    }
}
