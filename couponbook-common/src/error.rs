// ================================================================
// File: couponbook-common/src/error.rs
// ================================================================

use thiserror::Error;
use crate::models::coupon::CouponId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown coupon: {0}")]
    UnknownCoupon(CouponId),

    #[error("Coupon {coupon_id} has no uses left (limit {max_uses})")]
    UseLimitExceeded {
        coupon_id: CouponId,
        max_uses: u32,
    },

    #[error("Coupon {coupon_id} is cooling down ({remaining_ms} ms remaining)")]
    CooldownActive {
        coupon_id: CouponId,
        remaining_ms: u64,
    },

    /// Storage could not be written. Reads never surface this; they fall back
    /// to an empty ledger instead.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// True for the two eligibility gates (`UseLimitExceeded`, `CooldownActive`).
    pub fn is_gate_failure(&self) -> bool {
        matches!(self, Error::UseLimitExceeded { .. } | Error::CooldownActive { .. })
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}
