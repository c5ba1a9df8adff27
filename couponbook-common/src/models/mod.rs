// File: couponbook-common/src/models/mod.rs
pub mod coupon;
pub mod ledger;
pub mod eligibility;

pub use coupon::{CouponDefinition, CouponId};
pub use ledger::{Ledger, LedgerEntry};
pub use eligibility::{CouponState, EligibilitySnapshot, UsesLeft};
