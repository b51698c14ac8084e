//! Property-based tests for the engine's core invariants.
//!
//! These use proptest to verify the predicate and pricing invariants
//! across a wide range of carts, catching edge cases the scenario
//! tests might miss.

use proptest::prelude::*;
use rust_decimal::Decimal;

use promo_engine::services::eligibility::{
    evaluate_condition, is_variant_eligible, select_eligible_items, total_quantity,
};
use promo_engine::{CartItem, ProductVariantTarget, PromotionCondition};

fn item_strategy() -> impl Strategy<Value = CartItem> {
    (
        "[a-e]",
        proptest::option::of("[vw][1-3]"),
        1i32..20,
        0u64..100_000,
    )
        .prop_map(|(product_id, variant_id, quantity, cents)| CartItem {
            product_id,
            variant_id,
            quantity,
            price: Decimal::new(cents as i64, 2),
            discount: None,
        })
}

fn cart_strategy() -> impl Strategy<Value = Vec<CartItem>> {
    proptest::collection::vec(item_strategy(), 0..8)
}

fn targets_strategy() -> impl Strategy<Value = Vec<ProductVariantTarget>> {
    proptest::collection::vec(
        ("[a-e]", proptest::option::of(proptest::collection::hash_set("[vw][1-3]", 1..3)))
            .prop_map(|(product_id, variants)| match variants {
                None => ProductVariantTarget::all_variants(product_id),
                Some(set) => ProductVariantTarget::specific_variants(product_id, set),
            }),
        0..4,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn variant_eligibility_is_idempotent(cart in cart_strategy(), targets in targets_strategy()) {
        let first = is_variant_eligible(&cart, &targets);
        let second = is_variant_eligible(&cart, &targets);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn eligibility_agrees_with_selection(cart in cart_strategy(), targets in targets_strategy()) {
        let eligible = is_variant_eligible(&cart, &targets);
        let selected = select_eligible_items(&cart, &targets);
        if targets.is_empty() {
            prop_assert!(eligible);
            prop_assert_eq!(selected.len(), cart.len());
        } else {
            // The rule is eligible exactly when it would have a
            // non-empty discount base.
            prop_assert_eq!(eligible, !selected.is_empty());
        }
    }

    #[test]
    fn selection_is_a_subset_of_the_cart(cart in cart_strategy(), targets in targets_strategy()) {
        let selected = select_eligible_items(&cart, &targets);
        prop_assert!(selected.len() <= cart.len());
        for item in selected {
            prop_assert!(cart.iter().any(|original| original == item));
        }
    }

    #[test]
    fn min_amount_condition_matches_direct_comparison(
        cart in cart_strategy(),
        total_cents in 0u64..1_000_000,
        threshold_cents in 0u64..1_000_000,
    ) {
        let cart_total = Decimal::new(total_cents as i64, 2);
        let threshold = Decimal::new(threshold_cents as i64, 2);
        let condition = PromotionCondition::MinAmount { amount: threshold };
        prop_assert_eq!(
            evaluate_condition(&condition, &cart, cart_total),
            cart_total >= threshold
        );
    }

    #[test]
    fn min_quantity_condition_matches_summed_quantities(
        cart in cart_strategy(),
        threshold in 0i64..100,
    ) {
        let condition = PromotionCondition::MinQuantity { quantity: threshold };
        prop_assert_eq!(
            evaluate_condition(&condition, &cart, Decimal::ZERO),
            total_quantity(&cart) >= threshold
        );
    }
}

mod pricing {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use promo_engine::stores::{InMemoryPromotionStore, PromotionStore};
    use promo_engine::{
        EventSender, Promotion, PromotionAction, PromotionService, PromotionStatus,
    };

    fn capped_promotion(percent: Decimal, cap: Decimal) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4(),
            name: "Capped".to_string(),
            description: None,
            status: PromotionStatus::Active,
            priority: 0,
            stackable: false,
            start_date: now - Duration::hours(1),
            end_date: now + Duration::hours(1),
            conditions: Vec::new(),
            actions: vec![PromotionAction::PercentageOff {
                percent,
                max_discount: Some(cap),
            }],
            applicable_product_variants: Vec::new(),
            usage_count: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn capped_percentage_never_exceeds_the_cap(
            total_cents in 0u64..10_000_000,
            percent_points in 1u32..=100,
            cap_cents in 1u64..1_000_000,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            runtime.block_on(async {
                let store = Arc::new(InMemoryPromotionStore::new());
                let cap = Decimal::new(cap_cents as i64, 2);
                store
                    .insert(capped_promotion(Decimal::from(percent_points), cap))
                    .await
                    .expect("insert");

                let (tx, _rx) = mpsc::channel(8);
                let service = PromotionService::new(store, Arc::new(EventSender::new(tx)));

                let cart_total = Decimal::new(total_cents as i64, 2);
                let result = service
                    .calculate_cart_discount(&[], cart_total)
                    .await
                    .expect("resolution should not error");

                prop_assert!(result.total_discount <= cap);
                Ok(())
            })?;
        }
    }
}
