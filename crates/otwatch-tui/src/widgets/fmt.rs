//! Small display formatters shared by the pages.

use chrono::{DateTime, Utc};

/// `1.5 KB`, `20.0 MB`, ... with one decimal above bytes.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Coarse relative timestamp: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn time_ago(when: DateTime<Utc>) -> String {
    let secs = (Utc::now() - when).num_seconds().max(0);
    match secs {
        0..60 => "just now".into(),
        60..3_600 => format!("{}m ago", secs / 60),
        3_600..86_400 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Percentage with one decimal, for model metric columns.
pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn bytes_scale_through_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.5 KB");
        assert_eq!(human_bytes(20 * 1024 * 1024), "20.0 MB");
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(5)), "5m ago");
        assert_eq!(time_ago(now - Duration::hours(3)), "3h ago");
        assert_eq!(time_ago(now - Duration::days(2)), "2d ago");
        // Future timestamps clamp to zero.
        assert_eq!(time_ago(now + Duration::hours(1)), "just now");
    }
}
