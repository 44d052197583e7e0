//! Time formatting and parsing helpers for playback positions.

use std::time::Duration;

use crate::errors::PlayerKitError;

/// Formats seconds as `MM:SS`. Minutes are not wrapped into hours and
/// negative input renders as `00:00`.
///
/// # Examples
/// ```
/// # use pmoplayerkit::time_utils::time_str;
/// assert_eq!(time_str(75.9), "01:15");
/// assert_eq!(time_str(-3.0), "00:00");
/// ```
pub fn time_str(seconds: f64) -> String {
    if seconds < 0.0 || seconds.is_nan() {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Formats `current/total` for a progress label.
pub fn track_time_str(current: Duration, total: Duration) -> String {
    format!(
        "{}/{}",
        time_str(current.as_secs_f64()),
        time_str(total.as_secs_f64())
    )
}

/// Formats a duration as HH:MM:SS.
pub fn format_hhmmss(duration: Duration) -> String {
    let seconds = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Parses `HH:MM:SS`, `MM:SS` or `SS` into a duration.
pub fn parse_time_flexible(input: &str) -> Result<Duration, PlayerKitError> {
    let parts: Vec<&str> = input.split(':').collect();

    if parts.len() > 3 {
        return Err(PlayerKitError::InvalidTimeFormat(format!(
            "Invalid time format '{}': expected HH:MM:SS, MM:SS, or SS",
            input
        )));
    }

    let mut total = 0u64;
    for part in parts {
        let value = part.trim().parse::<u64>().map_err(|_| {
            PlayerKitError::InvalidTimeFormat(format!(
                "Invalid numeric value '{}' in time string '{}'",
                part, input
            ))
        })?;
        total = total
            .checked_mul(60)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(|| {
                PlayerKitError::InvalidTimeFormat(format!("Time '{}' is out of range", input))
            })?;
    }

    Ok(Duration::from_secs(total))
}
