//! Shared harness for exercising the engine against fully in-memory
//! collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use promo_engine::stores::{
    InMemoryCouponStore, InMemoryCouponUsageStore, InMemoryOrderHistory, InMemoryProductCatalog,
    InMemoryPromotionStore,
};
use promo_engine::{
    CartItem, Coupon, CouponDiscount, CouponService, CouponStatus, Event, EventSender, Promotion,
    PromotionAction, PromotionService, PromotionStatus,
};

/// Engine wired to in-memory stores, with direct handles to every
/// store so tests can seed state the admin surface cannot produce
/// (e.g. a coupon that is already half used up).
pub struct TestEngine {
    pub coupon_service: CouponService,
    pub promotion_service: PromotionService,
    pub coupons: Arc<InMemoryCouponStore>,
    pub usages: Arc<InMemoryCouponUsageStore>,
    pub promotions: Arc<InMemoryPromotionStore>,
    pub catalog: Arc<InMemoryProductCatalog>,
    pub orders: Arc<InMemoryOrderHistory>,
    pub events: mpsc::Receiver<Event>,
}

impl TestEngine {
    pub fn new() -> Self {
        // First caller wins; later attempts are no-ops.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let coupons = Arc::new(InMemoryCouponStore::new());
        let usages = Arc::new(InMemoryCouponUsageStore::new());
        let promotions = Arc::new(InMemoryPromotionStore::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let orders = Arc::new(InMemoryOrderHistory::new());

        let (tx, rx) = mpsc::channel(128);
        let event_sender = Arc::new(EventSender::new(tx));

        let coupon_service = CouponService::new(
            coupons.clone(),
            usages.clone(),
            catalog.clone(),
            orders.clone(),
            event_sender.clone(),
        );
        let promotion_service = PromotionService::new(promotions.clone(), event_sender);

        Self {
            coupon_service,
            promotion_service,
            coupons,
            usages,
            promotions,
            catalog,
            orders,
            events: rx,
        }
    }
}

pub fn item(product_id: &str, quantity: i32, price: Decimal) -> CartItem {
    CartItem {
        product_id: product_id.to_string(),
        variant_id: None,
        quantity,
        price,
        discount: None,
    }
}

pub fn item_with_variant(
    product_id: &str,
    variant_id: &str,
    quantity: i32,
    price: Decimal,
) -> CartItem {
    CartItem {
        product_id: product_id.to_string(),
        variant_id: Some(variant_id.to_string()),
        quantity,
        price,
        discount: None,
    }
}

/// An active, unrestricted coupon valid from an hour ago with no
/// expiry. Tests tweak the fields they care about.
pub fn base_coupon(code: &str, discount: CouponDiscount) -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        description: None,
        status: CouponStatus::Active,
        discount,
        start_date: now - Duration::hours(1),
        end_date: None,
        min_order_amount: None,
        min_quantity: None,
        usage_limit: None,
        usage_count: 0,
        per_user_limit: None,
        restricted_to_users: Vec::new(),
        applicable_products: Vec::new(),
        applicable_product_variants: Vec::new(),
        applicable_categories: Vec::new(),
        excluded_products: Vec::new(),
        first_order_only: false,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

/// An active promotion valid for the surrounding day. Tests tweak the
/// fields they care about.
pub fn base_promotion(
    name: &str,
    priority: i32,
    stackable: bool,
    action: PromotionAction,
) -> Promotion {
    let now = Utc::now();
    Promotion {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        status: PromotionStatus::Active,
        priority,
        stackable,
        start_date: now - Duration::hours(12),
        end_date: now + Duration::hours(12),
        conditions: Vec::new(),
        actions: vec![action],
        applicable_product_variants: Vec::new(),
        usage_count: 0,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}
