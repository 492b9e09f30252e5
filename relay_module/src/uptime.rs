//! Coarse human-readable uptime formatting for the status commands.

use chrono::{DateTime, Utc};

/// Seconds elapsed since `started_at`, clamped at zero.
pub fn seconds_since(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - started_at).num_seconds().max(0) as u64
}

/// Format an uptime the way the status replies expect: months (30-day),
/// days, hours and minutes, dropping zero parts, `kurang dari 1 menit`
/// when nothing is left.
pub fn format_uptime(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;

    let mut parts = Vec::new();
    if months > 0 {
        parts.push(format!("{} bulan", months));
    }
    if days % 30 > 0 {
        parts.push(format!("{} hari", days % 30));
    }
    if hours % 24 > 0 {
        parts.push(format!("{} jam", hours % 24));
    }
    if minutes % 60 > 0 {
        parts.push(format!("{} menit", minutes % 60));
    }

    if parts.is_empty() {
        "kurang dari 1 menit".to_string()
    } else {
        parts.join(", ")
    }
}
