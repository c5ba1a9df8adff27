//! Terminal rendering of coupon views and engine errors.

use couponbook_core::view::{format_cooldown, CategoryView, CouponView};
use couponbook_core::{CouponCatalog, CouponId, CouponState, EligibilitySnapshot, Error};
use couponbook_core::CooldownMap;

pub fn print_category_views(groups: &[CategoryView]) {
    if groups.is_empty() {
        println!("No coupons match.");
        return;
    }
    for group in groups {
        println!("== {} ==", group.category);
        for view in &group.coupons {
            print_view_line(view);
        }
        println!();
    }
}

fn state_badge(state: &CouponState) -> &'static str {
    match state {
        CouponState::Ready => "ready",
        CouponState::CoolingDown { .. } => "cooling",
        CouponState::Depleted => "used up",
    }
}

fn print_view_line(view: &CouponView) {
    println!(
        "  #{:<3} {:<28} [{}] {} | {}",
        view.definition.id,
        view.definition.title,
        state_badge(&view.state),
        view.uses_label,
        view.cooldown_label,
    );
}

pub fn print_view(view: &CouponView) {
    println!("#{} {}", view.definition.id, view.definition.title);
    println!("  {}", view.definition.description);
    println!("  category: {}", view.definition.category);
    println!("  state:    {}", state_badge(&view.state));
    println!("  uses:     {}", view.uses_label);
    if view.definition.cooldown_ms.is_some() {
        println!("  cooldown: {}", view.cooldown_label);
    }
}

/// One line listing every coupon that is still cooling down.
pub fn print_cooldown_line(catalog: &CouponCatalog, cooldowns: &CooldownMap) {
    let cooling: Vec<String> = cooldowns
        .iter()
        .filter(|(_, remaining)| **remaining > 0)
        .map(|(id, remaining)| {
            let title = catalog.get(*id).map(|c| c.title.as_str()).unwrap_or("?");
            format!("{} {}", title, format_cooldown(*remaining))
        })
        .collect();
    if !cooling.is_empty() {
        println!("  ⏳ {}", cooling.join(" · "));
    }
}

/// Success cue for a redemption.
pub fn celebrate(catalog: &CouponCatalog, coupon_id: CouponId, snapshot: &EligibilitySnapshot) {
    let title = catalog.get(coupon_id).map(|c| c.title.as_str()).unwrap_or("coupon");
    println!("🎉🎊 Redeemed \"{}\"! 🎊🎉", title);
    if snapshot.is_depleted {
        println!("   That was the last one.");
    } else {
        println!("   Uses left: {}", snapshot.uses_left);
    }
    if snapshot.remaining_cooldown_ms > 0 {
        println!("   Available again in {}.", format_cooldown(snapshot.remaining_cooldown_ms));
    }
}

/// User-facing wording for an engine error.
pub fn describe_error(err: &Error) -> String {
    match err {
        Error::UnknownCoupon(id) => format!("There is no coupon #{}.", id),
        Error::UseLimitExceeded { coupon_id, max_uses } => {
            format!("Coupon #{} is used up (limit {}).", coupon_id, max_uses)
        }
        Error::CooldownActive { remaining_ms, .. } => format!(
            "You need to wait before using this coupon again ({} left).",
            format_cooldown(*remaining_ms)
        ),
        Error::PersistenceUnavailable(reason) => {
            format!("Could not save the redemption, so nothing was redeemed: {}", reason)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_cooldown_uses_short_format() {
        let msg = describe_error(&Error::CooldownActive { coupon_id: 1, remaining_ms: 90_000 });
        assert_eq!(msg, "You need to wait before using this coupon again (1m left).");
    }

    #[test]
    fn test_describe_other_errors() {
        assert_eq!(describe_error(&Error::UnknownCoupon(4)), "There is no coupon #4.");
        assert_eq!(
            describe_error(&Error::UseLimitExceeded { coupon_id: 2, max_uses: 3 }),
            "Coupon #2 is used up (limit 3)."
        );
        assert!(describe_error(&Error::PersistenceUnavailable("disk full".into())).contains("nothing was redeemed"));
    }
}
