//! Coupon validation, redemption tracking, and the admin write path.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    CartItem, Coupon, CouponDiscount, CouponStatus, CouponUsage, ProductVariantTarget,
};
use crate::services::eligibility::{
    is_variant_eligible, select_eligible_items, total_quantity, window_status, WindowStatus,
};
use crate::stores::{CouponStore, CouponUsageStore, OrderHistory, ProductCatalog};

/// Outcome of validating a coupon against a cart.
///
/// A failed gate is a normal outcome, not an error: the result carries
/// a message for the checkout UI and `valid: false`. `restricted` marks
/// the case where the coupon itself is sound but the cart's contents
/// fall outside its variant targeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponValidation {
    pub valid: bool,
    pub discount: Decimal,
    pub free_shipping: bool,
    pub restricted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
}

impl CouponValidation {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            discount: Decimal::ZERO,
            free_shipping: false,
            restricted: false,
            message: Some(message.into()),
            coupon: None,
        }
    }

    fn restricted(message: impl Into<String>) -> Self {
        Self {
            restricted: true,
            ..Self::rejected(message)
        }
    }

    fn approved(coupon: Coupon, discount: Decimal, free_shipping: bool) -> Self {
        Self {
            valid: true,
            discount,
            free_shipping,
            restricted: false,
            message: None,
            coupon: Some(coupon),
        }
    }
}

/// Input for creating a coupon through the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCouponInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub description: Option<String>,
    pub discount: CouponDiscount,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_order_amount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub min_quantity: Option<i32>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1))]
    pub per_user_limit: Option<i32>,
    #[serde(default)]
    pub restricted_to_users: Vec<Uuid>,
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
}

impl CreateCouponInput {
    fn validate_shape(&self) -> Result<(), ServiceError> {
        if let Some(end) = self.end_date {
            if self.start_date >= end {
                error!("Coupon start date must be before end date");
                return Err(ServiceError::ValidationError(
                    "Coupon start date must be before end date".to_string(),
                ));
            }
        }
        match &self.discount {
            CouponDiscount::Fixed { amount } => {
                if *amount < Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Fixed discount amount cannot be negative".to_string(),
                    ));
                }
            }
            CouponDiscount::Percentage {
                percent,
                max_discount,
            } => {
                if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                    return Err(ServiceError::ValidationError(
                        "Percentage discount must be between 0 and 100".to_string(),
                    ));
                }
                if max_discount.is_some_and(|cap| cap < Decimal::ZERO) {
                    return Err(ServiceError::ValidationError(
                        "Maximum discount cannot be negative".to_string(),
                    ));
                }
            }
            CouponDiscount::FreeShipping => {}
        }
        if let Some(min) = self.min_order_amount {
            if min < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Minimum order amount cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Coupon gate-keeping and redemption tracking.
#[derive(Clone)]
pub struct CouponService {
    coupons: Arc<dyn CouponStore>,
    usages: Arc<dyn CouponUsageStore>,
    catalog: Arc<dyn ProductCatalog>,
    orders: Arc<dyn OrderHistory>,
    event_sender: Arc<EventSender>,
}

impl CouponService {
    pub fn new(
        coupons: Arc<dyn CouponStore>,
        usages: Arc<dyn CouponUsageStore>,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrderHistory>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            coupons,
            usages,
            catalog,
            orders,
            event_sender,
        }
    }

    /// Runs the full gate sequence for a coupon code against a cart.
    ///
    /// Gates are evaluated in a fixed order and the first failure wins,
    /// so the message the caller surfaces is the most specific reason
    /// available. Store failures propagate as errors; everything else
    /// is a structured result.
    #[instrument(skip(self, items), fields(code = %code))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        user_id: Option<Uuid>,
        cart_total: Decimal,
        items: &[CartItem],
    ) -> Result<CouponValidation, ServiceError> {
        let Some(coupon) = self.coupons.find_by_code(code).await? else {
            return Ok(CouponValidation::rejected("Invalid coupon code"));
        };
        if coupon.is_deleted {
            return Ok(CouponValidation::rejected("Invalid coupon code"));
        }

        if coupon.status != CouponStatus::Active {
            return Ok(CouponValidation::rejected("This coupon is not active"));
        }

        match window_status(Utc::now(), coupon.start_date, coupon.end_date) {
            WindowStatus::NotStarted => {
                return Ok(CouponValidation::rejected("This coupon is not valid yet"));
            }
            WindowStatus::Expired => {
                return Ok(CouponValidation::rejected("This coupon has expired"));
            }
            WindowStatus::Active => {}
        }

        if let Some(limit) = coupon.usage_limit {
            if coupon.usage_count >= limit {
                warn!("Coupon {} has reached its usage limit", coupon.code);
                return Ok(CouponValidation::rejected(
                    "This coupon has reached its usage limit",
                ));
            }
        }

        if !coupon.restricted_to_users.is_empty() {
            let allowed = user_id.is_some_and(|user| coupon.restricted_to_users.contains(&user));
            if !allowed {
                return Ok(CouponValidation::rejected(
                    "This coupon is not available for your account",
                ));
            }
        }

        if let (Some(limit), Some(user)) = (coupon.per_user_limit, user_id) {
            let used = self.usages.count_for_user(coupon.id, user).await?;
            if used >= i64::from(limit) {
                return Ok(CouponValidation::rejected(
                    "You have reached the usage limit for this coupon",
                ));
            }
        }

        if let Some(min) = coupon.min_order_amount {
            if cart_total < min {
                return Ok(CouponValidation::rejected(format!(
                    "A minimum order of {} is required for this coupon",
                    min
                )));
            }
        }

        if let Some(min) = coupon.min_quantity {
            if total_quantity(items) < i64::from(min) {
                return Ok(CouponValidation::rejected(format!(
                    "This coupon requires at least {} items in the cart",
                    min
                )));
            }
        }

        if !coupon.applicable_product_variants.is_empty()
            && !is_variant_eligible(items, &coupon.applicable_product_variants)
        {
            return Ok(CouponValidation::restricted(
                "This coupon does not apply to the items in your cart",
            ));
        }

        // The legacy product list only applies when variant targeting is
        // absent; variant targeting supersedes it entirely.
        if coupon.applicable_product_variants.is_empty() && !coupon.applicable_products.is_empty() {
            let any_applicable = items
                .iter()
                .any(|item| coupon.applicable_products.contains(&item.product_id));
            if !any_applicable {
                return Ok(CouponValidation::rejected(
                    "This coupon does not apply to the items in your cart",
                ));
            }
        }

        if !coupon.applicable_categories.is_empty()
            && !self.cart_matches_category(&coupon, items).await?
        {
            return Ok(CouponValidation::rejected(
                "This coupon only applies to selected product categories",
            ));
        }

        if !coupon.excluded_products.is_empty() {
            let all_excluded = items
                .iter()
                .all(|item| coupon.excluded_products.contains(&item.product_id));
            if all_excluded {
                return Ok(CouponValidation::rejected(
                    "This coupon cannot be used with the items in your cart",
                ));
            }
        }

        if coupon.first_order_only {
            let Some(user) = user_id else {
                return Ok(CouponValidation::rejected(
                    "This coupon is only valid on your first order",
                ));
            };
            if self.orders.has_prior_order(user).await? {
                return Ok(CouponValidation::rejected(
                    "This coupon is only valid on your first order",
                ));
            }
        }

        let (discount, free_shipping) = coupon_discount(&coupon, cart_total, items);
        Ok(CouponValidation::approved(coupon, discount, free_shipping))
    }

    /// Records one successful redemption: bumps the coupon's counter
    /// (atomically, refusing past the global limit) and appends the
    /// immutable usage record. No call-level deduplication happens
    /// here — callers tie this to order commit.
    #[instrument(skip(self))]
    pub async fn track_coupon_usage(
        &self,
        coupon_id: Uuid,
        user_id: Option<Uuid>,
        order_id: Uuid,
        discount_applied: Decimal,
    ) -> Result<CouponUsage, ServiceError> {
        let new_count = self.coupons.increment_usage(coupon_id).await?;

        let usage = CouponUsage {
            id: Uuid::new_v4(),
            coupon_id,
            user_id,
            order_id,
            discount_applied,
            used_at: Utc::now(),
        };
        self.usages.append(usage.clone()).await?;

        info!(
            "Coupon {} redeemed on order {} (usage count {})",
            coupon_id, order_id, new_count
        );
        self.event_sender
            .send_or_log(Event::CouponRedeemed {
                coupon_id,
                order_id,
                discount: discount_applied,
            })
            .await;

        Ok(usage)
    }

    /// Creates a coupon. Unlike the validate path, invariant violations
    /// here (bad input, duplicate code) surface as errors.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_coupon(&self, input: CreateCouponInput) -> Result<Coupon, ServiceError> {
        input.validate()?;
        input.validate_shape()?;

        let now = Utc::now();
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: input.code,
            description: input.description,
            status: CouponStatus::Active,
            discount: input.discount,
            start_date: input.start_date,
            end_date: input.end_date,
            min_order_amount: input.min_order_amount,
            min_quantity: input.min_quantity,
            usage_limit: input.usage_limit,
            usage_count: 0,
            per_user_limit: input.per_user_limit,
            restricted_to_users: input.restricted_to_users,
            applicable_products: input.applicable_products,
            applicable_product_variants: input.applicable_product_variants,
            applicable_categories: input.applicable_categories,
            excluded_products: input.excluded_products,
            first_order_only: input.first_order_only,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.coupons.insert(coupon.clone()).await?;

        info!("Coupon created: {} ({})", coupon.code, coupon.id);
        self.event_sender
            .send(Event::CouponCreated(coupon.id))
            .await
            .map_err(|e| {
                error!("Failed to send CouponCreated event: {}", e);
                ServiceError::EventError(e)
            })?;

        Ok(coupon)
    }

    /// Soft-deletes a coupon. The record and its usage history stay in
    /// place; the code simply stops resolving.
    #[instrument(skip(self))]
    pub async fn archive_coupon(&self, coupon_id: Uuid) -> Result<Coupon, ServiceError> {
        let mut coupon = self
            .coupons
            .find_by_id(coupon_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))?;

        coupon.is_deleted = true;
        coupon.updated_at = Utc::now();
        self.coupons.update(coupon.clone()).await?;

        info!("Coupon archived: {}", coupon_id);
        self.event_sender
            .send_or_log(Event::CouponArchived(coupon_id))
            .await;

        Ok(coupon)
    }

    /// Whether any cart product belongs to one of the coupon's
    /// applicable categories. Each distinct product is looked up once.
    async fn cart_matches_category(
        &self,
        coupon: &Coupon,
        items: &[CartItem],
    ) -> Result<bool, ServiceError> {
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.product_id.as_str()) {
                continue;
            }
            let categories = self.catalog.categories_of(&item.product_id).await?;
            if categories
                .iter()
                .any(|c| coupon.applicable_categories.contains(c))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Prices an approved coupon against the cart. Returns the discount
/// amount and whether shipping is waived.
fn coupon_discount(coupon: &Coupon, cart_total: Decimal, items: &[CartItem]) -> (Decimal, bool) {
    match &coupon.discount {
        CouponDiscount::Fixed { amount } => (*amount, false),
        CouponDiscount::FreeShipping => (Decimal::ZERO, true),
        CouponDiscount::Percentage {
            percent,
            max_discount,
        } => {
            let base = if !coupon.applicable_product_variants.is_empty() {
                select_eligible_items(items, &coupon.applicable_product_variants)
                    .iter()
                    .map(|item| item.line_total())
                    .sum()
            } else if !coupon.applicable_products.is_empty() {
                items
                    .iter()
                    .filter(|item| coupon.applicable_products.contains(&item.product_id))
                    .map(|item| item.line_total())
                    .sum()
            } else {
                cart_total
            };

            let excluded: Decimal = items
                .iter()
                .filter(|item| coupon.excluded_products.contains(&item.product_id))
                .map(|item| item.line_total())
                .sum();
            let base = (base - excluded).max(Decimal::ZERO);

            let discount = base * *percent / Decimal::ONE_HUNDRED;
            let discount = max_discount.map_or(discount, |cap| discount.min(cap));
            (discount, false)
        }
    }
}
