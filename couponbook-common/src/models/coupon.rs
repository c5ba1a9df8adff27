// File: couponbook-common/src/models/coupon.rs

use serde::{Deserialize, Serialize};

pub type CouponId = u32;

/// A single entry of the static coupon catalog.
///
/// Field names on the wire follow the catalog file: `uses` is the
/// redemption limit and `cooldown` is in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDefinition {
    pub id: CouponId,
    pub title: String,
    pub description: String,
    pub category: String,

    #[serde(default)]
    pub unlimited: bool,

    /// Ignored when `unlimited` is set.
    #[serde(rename = "uses", default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,

    #[serde(rename = "cooldown", default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
}

impl CouponDefinition {
    /// The enforced redemption limit, or `None` when nothing is enforced.
    ///
    /// Only a declared `uses` is enforced. `CouponCatalog` refuses limited
    /// coupons that leave it out, so a loaded catalog never shows a limit it
    /// does not apply.
    pub fn effective_max_uses(&self) -> Option<u32> {
        if self.unlimited {
            None
        } else {
            self.max_uses
        }
    }

    /// A limited coupon must declare a positive `uses`.
    pub fn has_valid_limit(&self) -> bool {
        self.unlimited || matches!(self.max_uses, Some(n) if n > 0)
    }

    /// Zero-length cooldowns count as "no cooldown".
    pub fn has_cooldown(&self) -> bool {
        matches!(self.cooldown_ms, Some(c) if c > 0)
    }
}
