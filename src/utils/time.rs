//! Time parsing utilities for crab-party
//!
//! DLNA renderers exchange positions as `H+:MM:SS[.F+]` strings.

/// Parses a DLNA position into seconds
///
/// Returns `None` for empty strings and the `NOT_IMPLEMENTED` placeholder some
/// renderers report.
pub fn parse_dlna_time(time_str: &str) -> Option<f64> {
    let mut parts = time_str.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Formats seconds as a DLNA `HH:MM:SS` target, truncating fractions
pub fn format_dlna_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
