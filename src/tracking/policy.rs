use serde::{Deserialize, Serialize};

/// Minimum clocked hours for a day to count as a full day.
pub const FULL_DAY_HOURS: f64 = 8.5;

/// Minimum clocked hours for a day to count as a half day. Anything shorter is leave.
pub const HALF_DAY_HOURS: f64 = 4.5;

/// Length of the required shift used for overage/shortfall reporting (9 hours).
pub const REQUIRED_SHIFT_MINUTES: i64 = 9 * 60;

/// Thresholds used when turning clocked time into a day status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendancePolicy {
    pub full_day_hours: f64,
    pub half_day_hours: f64,
    pub required_shift_minutes: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            full_day_hours: FULL_DAY_HOURS,
            half_day_hours: HALF_DAY_HOURS,
            required_shift_minutes: REQUIRED_SHIFT_MINUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_uses_named_thresholds() {
        let policy = AttendancePolicy::default();
        assert_eq!(policy.full_day_hours, 8.5);
        assert_eq!(policy.half_day_hours, 4.5);
        assert_eq!(policy.required_shift_minutes, 540);
    }
}
