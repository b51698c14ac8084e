//! Shared eligibility predicates.
//!
//! Pure functions over cart items and targeting rules; both the coupon
//! validator and the promotion resolver are built on top of these. All
//! numeric and date comparisons are inclusive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{CartItem, ProductVariantTarget, PromotionCondition};

/// Where an instant falls relative to a rule's lifecycle window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    NotStarted,
    Active,
    Expired,
}

/// Checks an instant against a `[start, end]` window. Both edges count
/// as inside; a missing end means the window never closes.
pub fn window_status(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> WindowStatus {
    if now < start {
        return WindowStatus::NotStarted;
    }
    if let Some(end) = end {
        if now > end {
            return WindowStatus::Expired;
        }
    }
    WindowStatus::Active
}

/// Whether the cart satisfies a rule's variant targeting.
///
/// An empty target list means the rule is unrestricted. Otherwise this
/// is an OR across targets: a single target covering a single cart line
/// is enough.
pub fn is_variant_eligible(items: &[CartItem], targets: &[ProductVariantTarget]) -> bool {
    if targets.is_empty() {
        return true;
    }
    targets
        .iter()
        .any(|target| items.iter().any(|item| target.matches(item)))
}

/// The cart lines a targeted rule's discount base is computed from.
/// With no targets the whole cart is the base.
pub fn select_eligible_items<'a>(
    items: &'a [CartItem],
    targets: &[ProductVariantTarget],
) -> Vec<&'a CartItem> {
    if targets.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| targets.iter().any(|target| target.matches(item)))
        .collect()
}

/// Summed quantity across all cart lines.
pub fn total_quantity(items: &[CartItem]) -> i64 {
    items.iter().map(|item| i64::from(item.quantity)).sum()
}

/// Evaluates a single promotion condition against the cart.
pub fn evaluate_condition(
    condition: &PromotionCondition,
    items: &[CartItem],
    cart_total: Decimal,
) -> bool {
    match condition {
        PromotionCondition::MinAmount { amount } => cart_total >= *amount,
        PromotionCondition::MinQuantity { quantity } => total_quantity(items) >= *quantity,
        PromotionCondition::SpecificProduct {
            product_ids,
            variant_ids,
        } => match variant_ids {
            Some(variants) => items.iter().any(|item| {
                product_ids.contains(&item.product_id)
                    && item
                        .variant_id
                        .as_ref()
                        .is_some_and(|v| variants.contains(v))
            }),
            None => items
                .iter()
                .any(|item| product_ids.contains(&item.product_id)),
        },
    }
}
