//! Promotion and coupon discount-resolution engine.
//!
//! This crate is the decision core of a retail checkout: given a cart
//! and a catalog of time-bounded, condition-gated discount rules, it
//! determines which discounts apply, in what combination, and for how
//! much. Two structurally similar subsystems share a set of pure
//! eligibility predicates:
//!
//! - [`services::coupons::CouponService`] validates a single
//!   code-activated coupon against a cart and user, and records
//!   redemptions after the order commits.
//! - [`services::promotions::PromotionService`] scans every active
//!   automatic promotion, filters by eligibility, and resolves
//!   priority/stackability conflicts into a combined discount.
//!
//! Storage, transport, and authentication are deliberately outside this
//! crate: every lookup goes through the ports in [`stores`], and the
//! in-memory implementations there are enough to embed the engine or
//! test it without infrastructure.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod errors;
pub mod events;
pub mod models;
pub mod services;
pub mod stores;

pub use errors::ServiceError;
pub use events::{Event, EventSender};
pub use models::{
    CartItem, Coupon, CouponDiscount, CouponStatus, CouponUsage, ProductVariantTarget, Promotion,
    PromotionAction, PromotionCondition, PromotionStatus, VariantSelection,
};
pub use services::coupons::{CouponService, CouponValidation, CreateCouponInput};
pub use services::promotions::{
    AppliedPromotion, CartDiscount, CreatePromotionInput, PromotionService,
};
