//! In-memory store implementations backed by `DashMap`.
//!
//! These are the fakes the test suite runs against and double as a
//! working backend for embedded callers that keep their rule catalog in
//! process. Each map entry is guarded by its shard lock, which is what
//! makes `increment_usage` an atomic check-and-increment.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Coupon, CouponUsage, Promotion, PromotionStatus};

use super::{CouponStore, CouponUsageStore, OrderHistory, ProductCatalog, PromotionStore};

#[derive(Debug, Default)]
pub struct InMemoryCouponStore {
    coupons: DashMap<Uuid, Coupon>,
    codes: DashMap<String, Uuid>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, ServiceError> {
        let Some(id) = self.codes.get(code).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.coupons.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>, ServiceError> {
        Ok(self.coupons.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, coupon: Coupon) -> Result<(), ServiceError> {
        match self.codes.entry(coupon.code.clone()) {
            Entry::Occupied(_) => Err(ServiceError::InvalidOperation(format!(
                "Coupon code {} already exists",
                coupon.code
            ))),
            Entry::Vacant(slot) => {
                slot.insert(coupon.id);
                self.coupons.insert(coupon.id, coupon);
                Ok(())
            }
        }
    }

    async fn update(&self, coupon: Coupon) -> Result<(), ServiceError> {
        let mut entry = self.coupons.get_mut(&coupon.id).ok_or_else(|| {
            ServiceError::NotFound(format!("Coupon {} not found", coupon.id))
        })?;
        if entry.code != coupon.code {
            return Err(ServiceError::InvalidOperation(
                "Coupon codes are immutable".to_string(),
            ));
        }
        *entry = coupon;
        Ok(())
    }

    async fn increment_usage(&self, id: Uuid) -> Result<i32, ServiceError> {
        let mut entry = self
            .coupons
            .get_mut(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", id)))?;
        if let Some(limit) = entry.usage_limit {
            if entry.usage_count >= limit {
                return Err(ServiceError::InvalidOperation(format!(
                    "Coupon {} has reached its usage limit",
                    entry.code
                )));
            }
        }
        entry.usage_count += 1;
        entry.updated_at = Utc::now();
        Ok(entry.usage_count)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCouponUsageStore {
    records: DashMap<Uuid, CouponUsage>,
}

impl InMemoryCouponUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CouponUsageStore for InMemoryCouponUsageStore {
    async fn append(&self, usage: CouponUsage) -> Result<(), ServiceError> {
        self.records.insert(usage.id, usage);
        Ok(())
    }

    async fn count_for_user(&self, coupon_id: Uuid, user_id: Uuid) -> Result<i64, ServiceError> {
        let count = self
            .records
            .iter()
            .filter(|r| r.coupon_id == coupon_id && r.user_id == Some(user_id))
            .count();
        Ok(count as i64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPromotionStore {
    promotions: DashMap<Uuid, Promotion>,
}

impl InMemoryPromotionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromotionStore for InMemoryPromotionStore {
    async fn find_active(&self) -> Result<Vec<Promotion>, ServiceError> {
        let mut active: Vec<Promotion> = self
            .promotions
            .iter()
            .filter(|p| p.status == PromotionStatus::Active && !p.is_deleted)
            .map(|p| p.value().clone())
            .collect();
        // DashMap iteration order is arbitrary; creation order gives the
        // stable scan order the resolver's tie-breaking relies on.
        active.sort_by_key(|p| p.created_at);
        Ok(active)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>, ServiceError> {
        Ok(self.promotions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, promotion: Promotion) -> Result<(), ServiceError> {
        self.promotions.insert(promotion.id, promotion);
        Ok(())
    }

    async fn update(&self, promotion: Promotion) -> Result<(), ServiceError> {
        let mut entry = self.promotions.get_mut(&promotion.id).ok_or_else(|| {
            ServiceError::NotFound(format!("Promotion {} not found", promotion.id))
        })?;
        *entry = promotion;
        Ok(())
    }
}

/// Product-to-categories mapping for category-targeted coupons.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    categories: DashMap<String, Vec<String>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign_categories<I, S>(&self, product_id: impl Into<String>, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.insert(
            product_id.into(),
            categories.into_iter().map(Into::into).collect(),
        );
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn categories_of(&self, product_id: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .categories
            .get(product_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

/// Tracks which users already have a non-cancelled order. Callers
/// record qualifying orders only; cancelled orders never enter the set.
#[derive(Debug, Default)]
pub struct InMemoryOrderHistory {
    users_with_orders: DashSet<Uuid>,
}

impl InMemoryOrderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_order(&self, user_id: Uuid) {
        self.users_with_orders.insert(user_id);
    }
}

#[async_trait]
impl OrderHistory for InMemoryOrderHistory {
    async fn has_prior_order(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.users_with_orders.contains(&user_id))
    }
}
