use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::calendar::ReportMonth;
use super::classifier::{Classification, DayStatus, Glyph, classify};
use super::duration::{Category, DurationLabel};
use super::policy::AttendancePolicy;
use super::record::DayRecord;
use crate::model::{attendance::AttendanceRecord, holiday::Holiday, leave_request::LeaveRequest};

/// Snapshots of the leave and holiday directories plus the evaluation date.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub leaves: &'a [LeaveRequest],
    pub holidays: &'a [Holiday],
    pub today: NaiveDate,
    pub policy: AttendancePolicy,
}

impl<'a> ReportContext<'a> {
    pub fn new(today: NaiveDate, policy: AttendancePolicy) -> Self {
        Self {
            leaves: &[],
            holidays: &[],
            today,
            policy,
        }
    }

    pub fn with_leaves(mut self, leaves: &'a [LeaveRequest]) -> Self {
        self.leaves = leaves;
        self
    }

    pub fn with_holidays(mut self, holidays: &'a [Holiday]) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn is_on_leave(&self, user_id: &str, date: NaiveDate) -> bool {
        self.leaves.iter().any(|leave| leave.covers(user_id, date))
    }

    pub fn holiday_name(&self, date: NaiveDate) -> Option<&'a str> {
        self.holidays
            .iter()
            .find(|holiday| holiday.date == date)
            .map(|holiday| holiday.name.as_str())
    }

    /// Classifies `user_id`'s day. Dates without a record fall back to a declared
    /// holiday, then to approved leave, before being reported as unrecorded.
    pub fn classify_day(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: Option<&DayRecord>,
    ) -> Classification {
        let on_leave = self.is_on_leave(user_id, date);
        if record.is_some() {
            return classify(record, on_leave, self.today, &self.policy);
        }

        let implied = if let Some(name) = self.holiday_name(date) {
            Some(DayRecord::labelled(
                user_id,
                date,
                DurationLabel::Custom(name.to_string()),
            ))
        } else if on_leave {
            Some(DayRecord::labelled(user_id, date, Category::Leave.into()))
        } else {
            None
        };

        classify(implied.as_ref(), false, self.today, &self.policy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day: u32,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: DayStatus,
    pub glyph: Glyph,
    pub label: String,
    pub day_credit: f64,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub user_id: String,
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub present_days: f64,
    pub leave_days: f64,
    pub absent_days: u32,
    pub total_hours: f64,
    /// `total_hours / present_days`, or 0 without present days
    pub average_hours: f64,
    /// `round(present_days / days_in_month * 100)`, always within 0..=100
    pub percentage: u32,
    pub days: Vec<DayEntry>,
}

/// Indexes one user's records by calendar day. Records with an unparseable date
/// are skipped; for duplicate dates the first record wins.
pub(crate) fn index_records<'r>(
    user_id: &str,
    records: impl IntoIterator<Item = &'r AttendanceRecord>,
) -> HashMap<NaiveDate, DayRecord> {
    let mut by_date = HashMap::new();
    for record in records.into_iter().filter(|r| r.user_id == user_id) {
        match DayRecord::parse(record) {
            Ok(day) => {
                by_date.entry(day.date).or_insert(day);
            }
            Err(e) => debug!(error = %e, user_id, "Skipping attendance record"),
        }
    }
    by_date
}

/// Folds one employee's month into present/leave/absent counters.
///
/// Records of other users and of other months are ignored, so the full record set
/// can be passed in. The input is only read.
pub fn summarize_month<'r>(
    user_id: &str,
    records: impl IntoIterator<Item = &'r AttendanceRecord>,
    context: &ReportContext<'_>,
    month: ReportMonth,
) -> MonthlySummary {
    let by_date = index_records(user_id, records);

    let mut summary = MonthlySummary {
        user_id: user_id.to_string(),
        year: month.year(),
        month: month.month(),
        days_in_month: month.days(),
        present_days: 0.0,
        leave_days: 0.0,
        absent_days: 0,
        total_hours: 0.0,
        average_hours: 0.0,
        percentage: 0,
        days: Vec::with_capacity(month.days() as usize),
    };

    for (index, date) in month.dates().enumerate() {
        let classification = context.classify_day(user_id, date, by_date.get(&date));

        summary.present_days += classification.day_credit;
        summary.leave_days += classification.leave_credit;
        summary.absent_days += classification.absent_credit;
        summary.total_hours += classification.hours.unwrap_or(0.0);

        summary.days.push(DayEntry {
            day: index as u32 + 1,
            date,
            status: classification.status,
            glyph: classification.glyph(),
            label: classification.display_text(),
            day_credit: classification.day_credit,
            hours: classification.hours,
        });
    }

    if summary.present_days > 0.0 {
        summary.average_hours = summary.total_hours / summary.present_days;
    }
    summary.percentage = percentage(summary.present_days, summary.days_in_month);
    summary
}

pub fn percentage(present_days: f64, days_in_month: u32) -> u32 {
    if days_in_month == 0 {
        return 0;
    }
    let pct = (present_days / days_in_month as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveStatus;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()
    }

    fn march() -> ReportMonth {
        ReportMonth::new(2025, 3).unwrap()
    }

    fn labelled(user: &str, date: &str, duration: &str) -> AttendanceRecord {
        AttendanceRecord {
            user_id: user.to_string(),
            date: date.to_string(),
            in_time: None,
            out_time: None,
            duration: duration.to_string(),
        }
    }

    fn clocked(user: &str, day: u32, from: u32, to: u32) -> AttendanceRecord {
        let in_time = Utc.with_ymd_and_hms(2025, 3, day, from, 0, 0).unwrap();
        let out_time = Utc.with_ymd_and_hms(2025, 3, day, to, 0, 0).unwrap();
        AttendanceRecord {
            user_id: user.to_string(),
            date: format!("2025-03-{:02}", day),
            in_time: Some(in_time),
            out_time: Some(out_time),
            duration: format!("{}h 0m", to - from),
        }
    }

    fn sample() -> Vec<AttendanceRecord> {
        vec![
            clocked("u1", 3, 9, 18),
            clocked("u1", 4, 9, 15),
            clocked("u1", 5, 9, 11),
            labelled("u1", "2025-03-06", "Leave"),
            labelled("u1", "2025-03-08T00:00:00.000Z", "Saturday Off"),
            labelled("u1", "2025-03-14", "Holi"),
            labelled("u1", "2025-03-17", "Absent"),
            labelled("u1", "not-a-date", "Leave"),
            clocked("u2", 3, 9, 18),
            labelled("u1", "2025-04-01", "Leave"),
        ]
    }

    #[test]
    fn counts_credits_across_the_month() {
        let records = sample();
        let context = ReportContext::new(today(), AttendancePolicy::default());
        let summary = summarize_month("u1", &records, &context, march());

        assert_eq!(summary.days_in_month, 31);
        // full day + half day + saturday off + holi
        assert_eq!(summary.present_days, 3.5);
        // half of the 6h day + 2h short shift + leave label
        assert_eq!(summary.leave_days, 2.5);
        // short shift + explicit absent
        assert_eq!(summary.absent_days, 2);
        assert_eq!(summary.total_hours, 9.0 + 6.0 + 2.0);
        assert_eq!(summary.average_hours, 17.0 / 3.5);
        assert_eq!(summary.percentage, 11);
        assert_eq!(summary.days.len(), 31);

        let glyphs: Vec<String> = summary.days[2..8].iter().map(|d| d.glyph.to_string()).collect();
        assert_eq!(glyphs, ["P", "H", "L", "L", "-", "Off"]);
        assert_eq!(summary.days[13].label, "Holi");
    }

    #[test]
    fn missing_days_are_not_counted_anywhere() {
        let context = ReportContext::new(today(), AttendancePolicy::default());
        let summary = summarize_month("nobody", &sample(), &context, march());

        assert_eq!(summary.present_days, 0.0);
        assert_eq!(summary.leave_days, 0.0);
        assert_eq!(summary.absent_days, 0);
        assert_eq!(summary.average_hours, 0.0);
        assert_eq!(summary.percentage, 0);
        assert!(summary.days.iter().all(|d| d.glyph == Glyph::NoRecord));
    }

    #[test]
    fn summarizing_is_idempotent_and_leaves_input_alone() {
        let records = sample();
        let before = records.clone();
        let context = ReportContext::new(today(), AttendancePolicy::default());

        let first = summarize_month("u1", &records, &context, march());
        let second = summarize_month("u1", &records, &context, march());

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn leap_february_has_29_days() {
        let context = ReportContext::new(today(), AttendancePolicy::default());
        let none: Vec<AttendanceRecord> = Vec::new();
        let feb_2024 = summarize_month("u1", &none, &context, ReportMonth::new(2024, 2).unwrap());
        let feb_2025 = summarize_month("u1", &none, &context, ReportMonth::new(2025, 2).unwrap());

        assert_eq!(feb_2024.days_in_month, 29);
        assert_eq!(feb_2025.days_in_month, 28);
    }

    #[test]
    fn holidays_and_approved_leave_fill_unrecorded_days() {
        let holidays = vec![Holiday {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            name: "Holi".to_string(),
            description: None,
        }];
        let leaves = vec![LeaveRequest {
            id: "leave-1".to_string(),
            user_id: "u1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 13).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            reason: None,
            status: LeaveStatus::Approved,
            created_at: None,
        }];
        let records = vec![labelled("u1", "2025-03-15", "Saturday Off")];
        let context = ReportContext::new(today(), AttendancePolicy::default())
            .with_leaves(&leaves)
            .with_holidays(&holidays);

        let summary = summarize_month("u1", &records, &context, march());

        assert_eq!(summary.days[12].status, DayStatus::Leave);
        assert_eq!(summary.days[13].status, DayStatus::Holiday);
        assert_eq!(summary.days[13].label, "Holi");
        // explicit record label beats the leave range
        assert_eq!(summary.days[14].status, DayStatus::SaturdayOff);
        assert_eq!(summary.present_days, 2.0);
        assert_eq!(summary.leave_days, 1.0);
    }

    #[test]
    fn first_duplicate_wins() {
        let records = vec![
            labelled("u1", "2025-03-03", "Leave"),
            labelled("u1", "2025-03-03T10:00:00Z", "Sunday Off"),
        ];
        let context = ReportContext::new(today(), AttendancePolicy::default());
        let summary = summarize_month("u1", &records, &context, march());
        assert_eq!(summary.days[2].status, DayStatus::Leave);
    }

    #[test]
    fn percentage_is_rounded_and_bounded() {
        assert_eq!(percentage(0.0, 30), 0);
        assert_eq!(percentage(15.5, 31), 50);
        assert_eq!(percentage(31.0, 31), 100);
        assert_eq!(percentage(40.0, 31), 100);
        assert_eq!(percentage(1.0, 0), 0);
    }
}
