// src/view/format.rs

const SECOND_MS: u64 = 1000;

/// Short human-readable cooldown, e.g. `45s`, `3m`, `2d`, `1mo`.
///
/// Each unit is the previous one integer-divided, always rounding down. Months
/// are counted as 30 days and only used from four weeks on.
pub fn format_cooldown(remaining_ms: u64) -> String {
    if remaining_ms == 0 {
        return "Ready".to_string();
    }

    let seconds = remaining_ms / SECOND_MS;
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 7 {
        return format!("{}d", days);
    }

    let weeks = days / 7;
    if weeks < 4 {
        return format!("{}w", weeks);
    }

    let months = days / 30;
    if months < 12 {
        return format!("{}mo", months);
    }

    format!("{}y", months / 12)
}
