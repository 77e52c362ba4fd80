use std::time::Duration;

use crate::summary::{Summary, bits_per_second};

/// Placeholder for values that cannot be computed (no packets, no samples).
pub const UNAVAILABLE: &str = "-";

/// Renders `bytes` over `elapsed` as bps / kbps / mbps.
pub fn format_bitrate(bytes: u64, elapsed: Duration) -> String {
    format_bps(bits_per_second(bytes, elapsed))
}

pub fn format_bps(bps: f64) -> String {
    if bps < 1_000.0 {
        format!("{}bps", bps as u64)
    } else if bps < 1_000_000.0 {
        format!("{:.1}kbps", bps / 1_000.0)
    } else {
        format!("{:.1}mbps", bps / 1_000_000.0)
    }
}

/// `num / total` as a percentage with at most three decimals, trailing zeros stripped.
pub fn format_percentage(num: u64, total: u64) -> String {
    if total == 0 {
        return UNAVAILABLE.to_string();
    }
    let pct = (num as f64) / (total as f64) * 100.0;
    trim_decimal(&format!("{pct:.3}"))
}

pub fn format_latency(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns < 1_000 {
        return format!("{ns}ns");
    }
    if ns < 1_000_000 {
        return format!("{}µs", trim_decimal(&format!("{:.3}", ns as f64 / 1e3)));
    }
    if ns < 1_000_000_000 {
        return format!("{}ms", trim_decimal(&format!("{:.3}", ns as f64 / 1e6)));
    }
    format!("{}s", trim_decimal(&format!("{:.3}", ns as f64 / 1e9)))
}

/// `(latency, dropped)` columns for one summary.
pub fn format_latency_and_dropped(s: &Summary) -> (String, String) {
    let latency = s
        .avg_latency()
        .map_or_else(|| UNAVAILABLE.to_string(), format_latency);

    let dropped = if s.packets > 0 {
        format!(
            "{} ({}%)",
            s.dropped,
            format_percentage(s.dropped, s.dropped.saturating_add(s.packets))
        )
    } else {
        UNAVAILABLE.to_string()
    };

    (latency, dropped)
}

fn trim_decimal(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
