// src/lib.rs

pub mod config;
pub mod utils;
pub mod eligibility;
pub mod catalog;
pub mod view;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod eventbus;

pub use couponbook_common::error::Error;
pub use couponbook_common::models::{
    CouponDefinition, CouponId, CouponState, EligibilitySnapshot, Ledger, LedgerEntry, UsesLeft,
};
pub use catalog::CouponCatalog;
pub use services::redemption_service::RedemptionEngine;
pub use tasks::cooldown_clock::{CooldownClock, CooldownMap};
pub use utils::time::{ManualTimeSource, SystemTimeSource, TimeSource};
