//! Collaborator seams the engine reads from and writes to.
//!
//! The evaluation logic never talks to a database directly; every
//! lookup the checkout path needs is an injected port so the engine can
//! run against any backing store, including the in-memory fakes used by
//! the test suite.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Coupon, CouponUsage, Promotion};

pub mod memory;

pub use memory::{
    InMemoryCouponStore, InMemoryCouponUsageStore, InMemoryOrderHistory, InMemoryProductCatalog,
    InMemoryPromotionStore,
};

#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Looks a coupon up by its case-sensitive code. Archived coupons
    /// are returned too; the validator decides what to do with them.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>, ServiceError>;

    /// Inserts a new coupon, failing with `InvalidOperation` when the
    /// code is already taken.
    async fn insert(&self, coupon: Coupon) -> Result<(), ServiceError>;

    /// Replaces the stored coupon. Codes are immutable once created.
    async fn update(&self, coupon: Coupon) -> Result<(), ServiceError>;

    /// Atomically increments `usage_count`, refusing with
    /// `InvalidOperation` once the global usage limit has been reached.
    /// Returns the new count.
    async fn increment_usage(&self, id: Uuid) -> Result<i32, ServiceError>;
}

#[async_trait]
pub trait CouponUsageStore: Send + Sync {
    /// Appends a redemption record. Records are immutable once written.
    async fn append(&self, usage: CouponUsage) -> Result<(), ServiceError>;

    /// How many times the given user has redeemed the given coupon.
    async fn count_for_user(&self, coupon_id: Uuid, user_id: Uuid) -> Result<i64, ServiceError>;
}

#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// Every ACTIVE, non-deleted promotion, in a stable scan order.
    /// Priority ties between promotions resolve by this order.
    async fn find_active(&self) -> Result<Vec<Promotion>, ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>, ServiceError>;

    async fn insert(&self, promotion: Promotion) -> Result<(), ServiceError>;

    async fn update(&self, promotion: Promotion) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Category ids the product belongs to. Unknown products yield an
    /// empty list rather than an error.
    async fn categories_of(&self, product_id: &str) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait OrderHistory: Send + Sync {
    /// Whether the user has at least one prior non-cancelled order.
    async fn has_prior_order(&self, user_id: Uuid) -> Result<bool, ServiceError>;
}
