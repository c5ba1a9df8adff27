//! src/eligibility.rs
//!
//! Pure eligibility rules. Nothing here reads the clock or touches storage;
//! callers pass in the catalog entry, the ledger entry and `now_ms`.

use std::collections::BTreeMap;
use couponbook_common::models::{
    CouponDefinition, CouponId, EligibilitySnapshot, Ledger, LedgerEntry, UsesLeft,
};

/// Computes whether `definition` can be redeemed at `now_ms` given its usage
/// so far.
///
/// Use limit and cooldown are independent gates: a depleted coupon stays
/// depleted whatever its cooldown says, and the cooldown keeps counting down
/// for display even once the coupon is depleted.
pub fn evaluate(
    definition: &CouponDefinition,
    entry: &LedgerEntry,
    now_ms: u64,
) -> EligibilitySnapshot {
    let uses_left = match definition.effective_max_uses() {
        None => UsesLeft::Unbounded,
        Some(max) => {
            let used = u32::try_from(entry.use_count).unwrap_or(u32::MAX);
            UsesLeft::Bounded(max.saturating_sub(used))
        }
    };
    let is_depleted = uses_left.is_exhausted();

    EligibilitySnapshot {
        coupon_id: definition.id,
        uses_left,
        is_depleted,
        remaining_cooldown_ms: remaining_cooldown_ms(definition, entry, now_ms),
    }
}

/// `cooldown - elapsed`, floored at zero. Elapsed time saturates at zero, so
/// a clock that stepped backwards reports the full cooldown.
pub fn remaining_cooldown_ms(definition: &CouponDefinition, entry: &LedgerEntry, now_ms: u64) -> u64 {
    match (definition.cooldown_ms, entry.last_used_at_ms) {
        (Some(cooldown), Some(last_used)) => {
            let elapsed = now_ms.saturating_sub(last_used);
            cooldown.saturating_sub(elapsed)
        }
        _ => 0,
    }
}

/// Remaining cooldown for every coupon that defines one.
pub fn remaining_cooldowns<'a, I>(coupons: I, ledger: &Ledger, now_ms: u64) -> BTreeMap<CouponId, u64>
where
    I: IntoIterator<Item = &'a CouponDefinition>,
{
    coupons
        .into_iter()
        .filter(|c| c.cooldown_ms.is_some())
        .map(|c| (c.id, remaining_cooldown_ms(c, &ledger.get(c.id), now_ms)))
        .collect()
}
