pub mod cart;
pub mod coupon;
pub mod promotion;
pub mod targeting;

pub use cart::CartItem;
pub use coupon::{Coupon, CouponDiscount, CouponStatus, CouponUsage};
pub use promotion::{Promotion, PromotionAction, PromotionCondition, PromotionStatus};
pub use targeting::{ProductVariantTarget, VariantSelection};
