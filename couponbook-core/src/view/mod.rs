//! src/view/mod.rs
//!
//! Display-ready projections of catalog + ledger. Everything here is
//! recomputed from scratch on demand.

pub mod format;

use serde::Serialize;
use couponbook_common::models::{
    CouponDefinition, CouponState, EligibilitySnapshot, Ledger, LedgerEntry, UsesLeft,
};
use crate::catalog::{group_by_category, CouponCatalog};
use crate::eligibility::evaluate;

pub use format::format_cooldown;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponView {
    pub definition: CouponDefinition,
    pub snapshot: EligibilitySnapshot,
    pub times_used: u64,
    pub state: CouponState,
    /// "2 of 3 uses left" or "Unlimited, used 4 times".
    pub uses_label: String,
    /// "Ready" or a short countdown such as "3m".
    pub cooldown_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub category: String,
    pub coupons: Vec<CouponView>,
}

pub fn build_view(definition: &CouponDefinition, entry: &LedgerEntry, now_ms: u64) -> CouponView {
    let snapshot = evaluate(definition, entry, now_ms);
    let uses_label = match (snapshot.uses_left, definition.effective_max_uses()) {
        (UsesLeft::Bounded(left), Some(max)) => format!("{} of {} uses left", left, max),
        _ => match entry.use_count {
            1 => "Unlimited, used once".to_string(),
            n => format!("Unlimited, used {} times", n),
        },
    };

    CouponView {
        definition: definition.clone(),
        snapshot,
        times_used: entry.use_count,
        state: snapshot.state(),
        uses_label,
        cooldown_label: format_cooldown(snapshot.remaining_cooldown_ms),
    }
}

/// Views for every coupon matching `search` (all coupons if `None`), grouped
/// by category.
pub fn build_category_views(
    catalog: &CouponCatalog,
    ledger: &Ledger,
    now_ms: u64,
    search: Option<&str>,
) -> Vec<CategoryView> {
    let matching = catalog.search(search.unwrap_or(""));
    group_by_category(matching)
        .into_iter()
        .map(|group| CategoryView {
            category: group.category.to_string(),
            coupons: group
                .coupons
                .into_iter()
                .map(|c| build_view(c, &ledger.get(c.id), now_ms))
                .collect(),
        })
        .collect()
}
