//! Formatting utilities for crab-party
//!
//! This module provides functions for formatting display strings,
//! particularly for device information and playback positions.

/// Formats a device description for display
///
/// # Arguments
/// * `device_type` - The device type
/// * `friendly_name` - The friendly name of the device
/// * `url` - The device URL
pub fn format_device_description(device_type: &str, friendly_name: &str, url: &str) -> String {
    format!("[{device_type}] {friendly_name} @ {url}")
}

/// Formats a device description with service type for display
pub fn format_device_with_service_description(
    device_type: &str,
    service_type: &str,
    friendly_name: &str,
    url: &str,
) -> String {
    format!("[{device_type}][{service_type}] {friendly_name} @ {url}")
}

/// Formats a playback position as `m:ss`, or `h:mm:ss` from one hour on
///
/// Negative and non-finite values render as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.9), "1:05");
        assert_eq!(format_duration(3599.0), "59:59");
        assert_eq!(format_duration(3725.0), "1:02:05");
        assert_eq!(format_duration(-4.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn test_device_description() {
        assert_eq!(
            format_device_description("MediaRenderer", "Living Room TV", "http://10.0.0.2:1400/"),
            "[MediaRenderer] Living Room TV @ http://10.0.0.2:1400/"
        );
    }
}
