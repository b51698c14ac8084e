//! Automatic promotion resolution: eligibility filtering, priority
//! ordering, and stackable-discount aggregation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    CartItem, ProductVariantTarget, Promotion, PromotionAction, PromotionCondition,
    PromotionStatus,
};
use crate::services::eligibility::{
    evaluate_condition, is_variant_eligible, select_eligible_items, window_status, WindowStatus,
};
use crate::stores::PromotionStore;

/// One promotion that made it into the applied set, with the discount
/// it contributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedPromotion {
    pub promotion: Promotion,
    pub discount: Decimal,
}

/// Result of resolving all automatic promotions against a cart.
///
/// An empty applied set is a normal outcome — the cart simply gets no
/// automatic discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscount {
    /// Applied promotions in priority order.
    pub applied: Vec<AppliedPromotion>,
    pub total_discount: Decimal,
}

impl CartDiscount {
    pub fn none() -> Self {
        Self {
            applied: Vec::new(),
            total_discount: Decimal::ZERO,
        }
    }

    /// The winning (highest-priority) applied promotion, for callers
    /// that predate stacking and expect a single promotion.
    pub fn primary(&self) -> Option<&AppliedPromotion> {
        self.applied.first()
    }
}

/// Input for creating a promotion through the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePromotionInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: PromotionStatus,
    pub priority: i32,
    #[serde(default)]
    pub stackable: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub conditions: Vec<PromotionCondition>,
    #[validate(length(min = 1))]
    pub actions: Vec<PromotionAction>,
    #[serde(default)]
    pub applicable_product_variants: Vec<ProductVariantTarget>,
}

impl CreatePromotionInput {
    fn validate_shape(&self) -> Result<(), ServiceError> {
        if self.start_date >= self.end_date {
            error!("Promotion start date must be before end date");
            return Err(ServiceError::ValidationError(
                "Promotion start date must be before end date".to_string(),
            ));
        }
        for action in &self.actions {
            match action {
                PromotionAction::PercentageOff {
                    percent,
                    max_discount,
                } => {
                    if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                        return Err(ServiceError::ValidationError(
                            "Percentage action must be between 0 and 100".to_string(),
                        ));
                    }
                    if max_discount.is_some_and(|cap| cap < Decimal::ZERO) {
                        return Err(ServiceError::ValidationError(
                            "Maximum discount cannot be negative".to_string(),
                        ));
                    }
                }
                PromotionAction::FixedOff { amount } => {
                    if *amount < Decimal::ZERO {
                        return Err(ServiceError::ValidationError(
                            "Fixed action amount cannot be negative".to_string(),
                        ));
                    }
                }
                PromotionAction::FreeShipping | PromotionAction::Bogo => {}
            }
        }
        Ok(())
    }
}

/// Scans the active promotion catalog and resolves which promotions
/// apply to a cart.
#[derive(Clone)]
pub struct PromotionService {
    promotions: Arc<dyn PromotionStore>,
    event_sender: Arc<EventSender>,
}

impl PromotionService {
    pub fn new(promotions: Arc<dyn PromotionStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            promotions,
            event_sender,
        }
    }

    /// Resolves the automatic discount for a cart.
    ///
    /// Two phases: first filter every active promotion down to the
    /// eligible, positively-priced set in descending priority order;
    /// then let the highest-priority survivor decide the combination.
    /// A non-stackable winner applies alone; a stackable winner takes
    /// every other stackable survivor with it, skipping non-stackable
    /// ones further down.
    #[instrument(skip(self, items))]
    pub async fn calculate_cart_discount(
        &self,
        items: &[CartItem],
        cart_total: Decimal,
    ) -> Result<CartDiscount, ServiceError> {
        let mut candidates = self.promotions.find_active().await?;
        // Stable sort: the store's scan order breaks priority ties.
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        let now = Utc::now();
        let mut eligible: Vec<AppliedPromotion> = Vec::new();
        for promotion in candidates {
            if window_status(now, promotion.start_date, Some(promotion.end_date))
                != WindowStatus::Active
            {
                continue;
            }
            if !is_variant_eligible(items, &promotion.applicable_product_variants) {
                continue;
            }
            if !promotion
                .conditions
                .iter()
                .all(|condition| evaluate_condition(condition, items, cart_total))
            {
                continue;
            }

            let discount = promotion_discount(&promotion, items, cart_total);
            if discount <= Decimal::ZERO {
                // Matched but priced to nothing; treated as not applied.
                debug!("Promotion {} matched but yields no discount", promotion.id);
                continue;
            }
            eligible.push(AppliedPromotion {
                promotion,
                discount,
            });
        }

        if eligible.is_empty() {
            return Ok(CartDiscount::none());
        }

        let applied = if eligible[0].promotion.stackable {
            eligible
                .into_iter()
                .filter(|entry| entry.promotion.stackable)
                .collect()
        } else {
            // A non-stackable winner applies exclusively.
            eligible.truncate(1);
            eligible
        };

        let total_discount = applied.iter().map(|entry| entry.discount).sum();
        debug!(
            "Applied {} promotion(s) for a discount of {}",
            applied.len(),
            total_discount
        );
        Ok(CartDiscount {
            applied,
            total_discount,
        })
    }

    /// Creates a promotion. Invariant violations surface as errors.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_promotion(
        &self,
        input: CreatePromotionInput,
    ) -> Result<Promotion, ServiceError> {
        input.validate()?;
        input.validate_shape()?;

        let now = Utc::now();
        let promotion = Promotion {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            status: input.status,
            priority: input.priority,
            stackable: input.stackable,
            start_date: input.start_date,
            end_date: input.end_date,
            conditions: input.conditions,
            actions: input.actions,
            applicable_product_variants: input.applicable_product_variants,
            usage_count: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.promotions.insert(promotion.clone()).await?;

        info!(
            "Promotion created: {} ({}, status {})",
            promotion.name, promotion.id, promotion.status
        );
        self.event_sender
            .send(Event::PromotionCreated(promotion.id))
            .await
            .map_err(|e| {
                error!("Failed to send PromotionCreated event: {}", e);
                ServiceError::EventError(e)
            })?;

        Ok(promotion)
    }

    /// Takes a promotion out of rotation without deleting it.
    #[instrument(skip(self))]
    pub async fn deactivate_promotion(&self, promotion_id: Uuid) -> Result<Promotion, ServiceError> {
        let mut promotion = self
            .promotions
            .find_by_id(promotion_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotion {} not found", promotion_id))
            })?;

        promotion.status = PromotionStatus::Inactive;
        promotion.updated_at = Utc::now();
        self.promotions.update(promotion.clone()).await?;

        info!("Promotion deactivated: {}", promotion_id);
        self.event_sender
            .send(Event::PromotionDeactivated(promotion_id))
            .await
            .map_err(|e| {
                error!(
                    "Failed to send PromotionDeactivated event for promotion {}: {}",
                    promotion_id, e
                );
                ServiceError::EventError(e)
            })?;

        Ok(promotion)
    }
}

/// Prices a promotion against the cart from its first action only.
/// Additional actions are intentionally not evaluated.
fn promotion_discount(promotion: &Promotion, items: &[CartItem], cart_total: Decimal) -> Decimal {
    let Some(action) = promotion.actions.first() else {
        return Decimal::ZERO;
    };
    match action {
        PromotionAction::PercentageOff {
            percent,
            max_discount,
        } => {
            let base = if promotion.applicable_product_variants.is_empty() {
                cart_total
            } else {
                select_eligible_items(items, &promotion.applicable_product_variants)
                    .iter()
                    .map(|item| item.line_total())
                    .sum()
            };
            let discount = base * *percent / Decimal::ONE_HUNDRED;
            max_discount.map_or(discount, |cap| discount.min(cap))
        }
        PromotionAction::FixedOff { amount } => *amount,
        // Not priced against the cart yet.
        PromotionAction::FreeShipping | PromotionAction::Bogo => Decimal::ZERO,
    }
}
