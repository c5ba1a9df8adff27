// File: couponbook-common/src/models/ledger.rs

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::coupon::CouponId;

/// Usage record for one coupon. Coupons that were never redeemed have no
/// stored entry; `LedgerEntry::default()` stands in for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub use_count: u64,

    /// Epoch millis of the latest redemption, `None` if never used.
    #[serde(default)]
    pub last_used_at_ms: Option<u64>,
}

impl LedgerEntry {
    pub fn is_unused(&self) -> bool {
        self.use_count == 0 && self.last_used_at_ms.is_none()
    }

    /// The entry after one more redemption at `at_ms`.
    pub fn with_use(self, at_ms: u64) -> Self {
        Self {
            use_count: self.use_count + 1,
            last_used_at_ms: Some(at_ms),
        }
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at_ms
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

/// Redemption history for the whole catalog.
///
/// The ledger is a plain value: mutation goes through `record_use`, which
/// hands back a new ledger, so the caller decides when a change becomes
/// visible (after it has been persisted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<CouponId, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<CouponId, LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Stored entry, or the implicit zero entry for coupons never used.
    pub fn get(&self, coupon_id: CouponId) -> LedgerEntry {
        self.entries.get(&coupon_id).copied().unwrap_or_default()
    }

    /// Returns a new ledger with one more use of `coupon_id` at `at_ms`.
    /// Every other entry is carried over unchanged.
    pub fn record_use(&self, coupon_id: CouponId, at_ms: u64) -> Ledger {
        let mut entries = self.entries.clone();
        let updated = self.get(coupon_id).with_use(at_ms);
        entries.insert(coupon_id, updated);
        Ledger { entries }
    }

    pub fn entries(&self) -> &BTreeMap<CouponId, LedgerEntry> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<CouponId, LedgerEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_redemptions(&self) -> u64 {
        self.entries.values().map(|e| e.use_count).sum()
    }
}
