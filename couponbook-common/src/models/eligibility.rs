// File: couponbook-common/src/models/eligibility.rs

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::models::coupon::CouponId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum UsesLeft {
    Bounded(u32),
    Unbounded,
}

impl UsesLeft {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, UsesLeft::Bounded(0))
    }
}

impl fmt::Display for UsesLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsesLeft::Bounded(n) => write!(f, "{}", n),
            UsesLeft::Unbounded => write!(f, "∞"),
        }
    }
}

/// Point-in-time eligibility of one coupon. Derived from the catalog entry,
/// the ledger entry and a clock reading; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySnapshot {
    pub coupon_id: CouponId,
    pub uses_left: UsesLeft,
    pub is_depleted: bool,
    /// 0 means ready.
    pub remaining_cooldown_ms: u64,
}

impl EligibilitySnapshot {
    pub fn is_redeemable(&self) -> bool {
        !self.is_depleted && self.remaining_cooldown_ms == 0
    }

    pub fn state(&self) -> CouponState {
        if self.is_depleted {
            CouponState::Depleted
        } else if self.remaining_cooldown_ms > 0 {
            CouponState::CoolingDown { remaining_ms: self.remaining_cooldown_ms }
        } else {
            CouponState::Ready
        }
    }
}

/// Derived per-coupon state. `Depleted` is absorbing and wins over a running
/// cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponState {
    Ready,
    CoolingDown { remaining_ms: u64 },
    Depleted,
}
