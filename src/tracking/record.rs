use chrono::{DateTime, NaiveDate, Utc};

use super::calendar::parse_date_key;
use super::duration::DurationLabel;
use super::error::TrackingError;
use super::shift::elapsed_minutes;
use crate::model::attendance::AttendanceRecord;

/// An [`AttendanceRecord`] after ingestion: the date truncated to a calendar day
/// and the `duration` text parsed into a [`DurationLabel`].
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub in_time: Option<DateTime<Utc>>,
    pub out_time: Option<DateTime<Utc>>,
    pub label: DurationLabel,
}

impl DayRecord {
    pub fn parse(record: &AttendanceRecord) -> Result<Self, TrackingError> {
        Ok(Self {
            user_id: record.user_id.clone(),
            date: parse_date_key(&record.date)?,
            in_time: record.in_time,
            out_time: record.out_time,
            label: DurationLabel::parse(&record.duration),
        })
    }

    /// A record carrying only a label, used for days implied by holidays or approved leave.
    pub fn labelled(user_id: &str, date: NaiveDate, label: DurationLabel) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
            in_time: None,
            out_time: None,
            label,
        }
    }

    /// Hours between clock-in and clock-out, negative if reversed.
    pub fn clocked_hours(&self) -> Option<f64> {
        match (self.in_time, self.out_time) {
            (Some(start), Some(end)) => Some((end - start).num_seconds() as f64 / 3600.0),
            _ => None,
        }
    }

    /// Clocked minutes, or the minutes written in an elapsed label when the instants are missing.
    pub fn worked_minutes(&self) -> Option<i64> {
        match (self.in_time, self.out_time, &self.label) {
            (Some(start), Some(end), _) => Some(elapsed_minutes(start, end)),
            (_, _, DurationLabel::Elapsed { minutes }) => Some(*minutes),
            _ => None,
        }
    }

    /// Clocked hours, or the hours written in an elapsed label when the instants are missing.
    pub fn worked_hours(&self) -> Option<f64> {
        self.clocked_hours().or(match self.label {
            DurationLabel::Elapsed { minutes } => Some(minutes as f64 / 60.0),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(date: &str, duration: &str) -> AttendanceRecord {
        AttendanceRecord {
            user_id: "u1".to_string(),
            date: date.to_string(),
            in_time: None,
            out_time: None,
            duration: duration.to_string(),
        }
    }

    #[test]
    fn timestamp_dates_are_truncated() {
        let day = DayRecord::parse(&raw("2025-03-03T00:00:00.000Z", "Leave")).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(DayRecord::parse(&raw("yesterday", "")).is_err());
    }

    #[test]
    fn worked_hours_prefers_instants_over_label() {
        let mut record = raw("2025-03-03", "2h 0m");
        let day = DayRecord::parse(&record).unwrap();
        assert_eq!(day.clocked_hours(), None);
        assert_eq!(day.worked_hours(), Some(2.0));

        record.in_time = Some(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap());
        record.out_time = Some(Utc.with_ymd_and_hms(2025, 3, 3, 13, 30, 0).unwrap());
        let day = DayRecord::parse(&record).unwrap();
        assert_eq!(day.worked_hours(), Some(4.5));
    }
}
