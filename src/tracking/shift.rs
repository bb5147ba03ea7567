use chrono::{DateTime, Utc};

/// Whole minutes between clock-in and clock-out. Negative when the instants are reversed.
pub fn elapsed_minutes(in_time: DateTime<Utc>, out_time: DateTime<Utc>) -> i64 {
    (out_time - in_time).num_minutes()
}

/// Renders minutes as `"Xh Ym"`. Negative input renders as `"0h 0m"`.
pub fn format_elapsed(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Signed difference between worked minutes and the required shift, e.g. `"+0h 15m"` or `"-0h 20m"`.
pub fn format_shift_delta(duration_minutes: i64, required_minutes: i64) -> String {
    let delta = duration_minutes - required_minutes;
    let sign = if delta >= 0 { '+' } else { '-' };
    let delta = delta.abs();
    format!("{}{}h {}m", sign, delta / 60, delta % 60)
}

/// Elapsed time followed by the shift delta, e.g. `"8h 40m (-0h 20m)"`.
pub fn describe_shift(duration_minutes: i64, required_minutes: i64) -> String {
    format!(
        "{} ({})",
        format_elapsed(duration_minutes),
        format_shift_delta(duration_minutes, required_minutes)
    )
}
