use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::targeting::ProductVariantTarget;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionStatus {
    #[default]
    Active,
    Inactive,
    Scheduled,
}

/// One gate a cart must pass for the promotion to be eligible. All of
/// a promotion's conditions must hold together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionCondition {
    /// Cart total must reach this amount (inclusive).
    MinAmount { amount: Decimal },
    /// Summed quantity across all lines must reach this count
    /// (inclusive).
    MinQuantity { quantity: i64 },
    /// At least one line must carry one of these products; when a
    /// variant set is given, the line must also carry one of those
    /// variants.
    SpecificProduct {
        product_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_ids: Option<HashSet<String>>,
    },
}

/// What an eligible promotion does to the cart. The resolver only
/// consumes a promotion's first action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionAction {
    PercentageOff {
        percent: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_discount: Option<Decimal>,
    },
    FixedOff {
        amount: Decimal,
    },
    /// Not priced against the cart; carries no amount yet.
    FreeShipping,
    /// Not priced against the cart; carries no amount yet.
    Bogo,
}

/// An automatic, code-less discount applied to every qualifying cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: PromotionStatus,

    /// Higher priority is evaluated first; the highest-priority
    /// eligible promotion decides whether others may stack with it.
    pub priority: i32,
    pub stackable: bool,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    #[serde(default)]
    pub conditions: Vec<PromotionCondition>,
    pub actions: Vec<PromotionAction>,
    #[serde(default)]
    pub applicable_product_variants: Vec<ProductVariantTarget>,

    pub usage_count: i32,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
