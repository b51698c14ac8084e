use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::targeting::ProductVariantTarget;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponStatus {
    Active,
    Inactive,
}

/// The discount a coupon grants once every gate has passed.
///
/// Each shape carries exactly the fields that are meaningful for it; in
/// particular the cap only exists on percentage discounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponDiscount {
    Fixed {
        amount: Decimal,
    },
    Percentage {
        percent: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_discount: Option<Decimal>,
    },
    /// Waives shipping rather than discounting the cart; the checkout
    /// flow interprets the flag on the validation result.
    FreeShipping,
}

/// A user-redeemable, code-activated discount.
///
/// Codes are unique (case-sensitive) and enforced at creation. Coupons
/// are never hard-deleted; `is_deleted` retires them while keeping the
/// audit trail intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: CouponStatus,
    pub discount: CouponDiscount,

    pub start_date: DateTime<Utc>,
    /// Absent means the coupon never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_quantity: Option<i32>,

    /// Global redemption cap across all users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<i32>,
    /// Incremented exactly once per successful redemption.
    pub usage_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_user_limit: Option<i32>,

    /// Allow-list of account ids; empty means open to everyone.
    #[serde(default)]
    pub restricted_to_users: Vec<Uuid>,
    /// Legacy product-level allow-list, superseded by
    /// `applicable_product_variants` whenever that list is non-empty.
    #[serde(default)]
    pub applicable_products: Vec<String>,
    #[serde(default)]
    pub applicable_product_variants: Vec<ProductVariantTarget>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub excluded_products: Vec<String>,
    #[serde(default)]
    pub first_order_only: bool,

    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one coupon redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    /// Absent for guest checkouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub order_id: Uuid,
    pub discount_applied: Decimal,
    pub used_at: DateTime<Utc>,
}
