//! Property-based tests for the product table and store keys.
//!
//! These tests use proptest to verify the filter and ordering invariants
//! across arbitrary inventories.

use inventory_admin::{
    models::{InventoryRecord, Product, ProductId},
    screen::filter_and_sort,
    store::is_valid_key,
};
use proptest::prelude::*;

// Strategies for generating test data
fn record_strategy() -> impl Strategy<Value = (String, String, bool)> {
    ("[A-Za-z ]{0,12}", "[A-Za-z ]{0,16}", any::<bool>())
}

fn inventory_strategy() -> impl Strategy<Value = Vec<InventoryRecord>> {
    prop::collection::vec(record_strategy(), 0..40).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(index, (name, description, archive))| InventoryRecord {
                product: Product {
                    unique_id: ProductId::parse((1_700_000_000_000u64 + index as u64).to_string())
                        .unwrap(),
                    product_name: name,
                    description,
                    archive,
                    ..Default::default()
                },
                image: None,
            })
            .collect()
    })
}

fn position(records: &[InventoryRecord], id: &ProductId) -> usize {
    records.iter().position(|r| r.id() == id).unwrap()
}

// Property: archived rows always follow active rows, and each group keeps fetch order
proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn archived_rows_sort_last_and_stably(records in inventory_strategy(), query in "[a-z]{0,2}") {
        let visible = filter_and_sort(&records, &query);

        let first_archived = visible.iter().position(|r| r.is_archived()).unwrap_or(visible.len());
        prop_assert!(visible[first_archived..].iter().all(|r| r.is_archived()));
        prop_assert!(visible[..first_archived].iter().all(|r| !r.is_archived()));

        for pair in visible[..first_archived].windows(2).chain(visible[first_archived..].windows(2)) {
            prop_assert!(position(&records, pair[0].id()) < position(&records, pair[1].id()));
        }
    }

    #[test]
    fn filter_ignores_case(records in inventory_strategy(), query in "[A-Za-z]{1,3}") {
        let lower = filter_and_sort(&records, &query.to_lowercase());
        let upper = filter_and_sort(&records, &query.to_uppercase());
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn filter_keeps_exactly_the_matches(records in inventory_strategy(), query in "[a-z]{1,2}") {
        let visible = filter_and_sort(&records, &query);
        let expected = records
            .iter()
            .filter(|r| {
                r.product.product_name.to_lowercase().contains(&query)
                    || r.product.description.to_lowercase().contains(&query)
            })
            .count();
        prop_assert_eq!(visible.len(), expected);
    }

    #[test]
    fn empty_query_shows_everything(records in inventory_strategy()) {
        prop_assert_eq!(filter_and_sort(&records, "").len(), records.len());
    }
}

// Property: generated-style ids are valid keys, path separators never are
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn numeric_ids_are_valid_keys(n in 0u64..u64::MAX) {
        prop_assert!(is_valid_key(&n.to_string()));
    }

    #[test]
    fn keys_with_forbidden_characters_are_rejected(
        prefix in "[a-z0-9]{0,5}",
        bad in prop::sample::select(vec!['/', '.', '#', '$', '[', ']']),
        suffix in "[a-z0-9]{0,5}",
    ) {
        let key = format!("{prefix}{bad}{suffix}");
        prop_assert!(!is_valid_key(&key));
        prop_assert!(ProductId::parse(key).is_err());
    }
}
