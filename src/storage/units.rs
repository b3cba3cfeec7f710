//! Human-readable sizes and percentages.
//!
//! Figures are shown with at most two decimals and no trailing zeros
//! (`60`, `12.5`, `3.14`), sizes in decimal units as storage vendors
//! label their devices.

use super::StorageSnapshot;

const KB: u64 = 1_000;
const MB: u64 = KB * 1_000;
const GB: u64 = MB * 1_000;

/// Round to two decimals and drop trailing zeros.
fn short_decimal(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Bytes as a bare gigabyte figure, used in the "used / free" size line.
pub fn format_gb(bytes: u64) -> String {
    short_decimal(bytes as f64 / GB as f64)
}

pub fn format_percent(percent: f64) -> String {
    short_decimal(percent)
}

/// "Used: X GB  Free: Y GB  Total: Z GB"
pub fn usage_line(snapshot: &StorageSnapshot) -> String {
    format!(
        "Used: {} GB  Free: {} GB  Total: {} GB",
        format_gb(snapshot.used_bytes()),
        format_gb(snapshot.free_bytes()),
        format_gb(snapshot.total_bytes()),
    )
}
