use chrono::NaiveDate;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use super::duration::{Category, DurationLabel};
use super::policy::AttendancePolicy;
use super::record::DayRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    #[strum(serialize = "Absent")]
    Absent,
    #[strum(serialize = "Saturday Off")]
    SaturdayOff,
    #[strum(serialize = "Sunday Off")]
    SundayOff,
    #[strum(serialize = "Leave")]
    Leave,
    #[strum(serialize = "Half Day")]
    HalfDay,
    #[strum(serialize = "Holiday")]
    Holiday,
    #[strum(serialize = "Full Day")]
    FullDay,
    #[strum(serialize = "In Progress")]
    InProgress,
}

/// Short cell value used by the monthly grid and its export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema, Display)]
pub enum Glyph {
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Present,
    #[serde(rename = "H")]
    #[strum(serialize = "H")]
    Half,
    #[serde(rename = "L")]
    #[strum(serialize = "L")]
    Leave,
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Absent,
    #[serde(rename = "Off")]
    #[strum(serialize = "Off")]
    Off,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    NoRecord,
}

/// Outcome of classifying one day.
///
/// `day_credit` feeds present days, `leave_credit` leave days and `absent_credit`
/// absent days. A day can contribute to more than one counter (half days split
/// between present and leave, short shifts count as both leave and absence).
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: DayStatus,
    pub has_record: bool,
    pub day_credit: f64,
    pub leave_credit: f64,
    pub absent_credit: u32,
    /// Clocked hours, present only when both instants exist. Clamped at zero.
    pub hours: Option<f64>,
    /// Text shown instead of the status name ("Diwali", "1st Half Day").
    pub label: Option<String>,
}

impl Classification {
    fn new(status: DayStatus, record: &DayRecord) -> Self {
        Self {
            status,
            has_record: true,
            day_credit: 0.0,
            leave_credit: 0.0,
            absent_credit: 0,
            hours: record.clocked_hours().map(|h| h.max(0.0)),
            label: None,
        }
    }

    fn unrecorded() -> Self {
        Self {
            status: DayStatus::Absent,
            has_record: false,
            day_credit: 0.0,
            leave_credit: 0.0,
            absent_credit: 0,
            hours: None,
            label: None,
        }
    }

    fn credit(mut self, day: f64, leave: f64, absent: u32) -> Self {
        self.day_credit = day;
        self.leave_credit = leave;
        self.absent_credit = absent;
        self
    }

    fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_text(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.status.to_string(),
        }
    }

    pub fn glyph(&self) -> Glyph {
        match self.status {
            _ if !self.has_record => Glyph::NoRecord,
            DayStatus::FullDay => Glyph::Present,
            DayStatus::HalfDay => Glyph::Half,
            DayStatus::Leave => Glyph::Leave,
            DayStatus::SaturdayOff | DayStatus::SundayOff | DayStatus::Holiday => Glyph::Off,
            DayStatus::Absent | DayStatus::InProgress => Glyph::Absent,
        }
    }
}

/// Maps one day's record to a status and its credits.
///
/// `on_leave` is the leave directory's independent view of the date; it turns any
/// record into leave except explicit Saturday/Sunday off labels. `today` separates
/// an open shift (clocked in, not yet out) from a forgotten clock-out.
pub fn classify(
    record: Option<&DayRecord>,
    on_leave: bool,
    today: NaiveDate,
    policy: &AttendancePolicy,
) -> Classification {
    let Some(record) = record else {
        return Classification::unrecorded();
    };

    let label = &record.label;
    if label.is_category(Category::SaturdayOff) {
        return Classification::new(DayStatus::SaturdayOff, record).credit(1.0, 0.0, 0);
    }
    if label.is_category(Category::SundayOff) {
        return Classification::new(DayStatus::SundayOff, record).credit(1.0, 0.0, 0);
    }
    if label.is_category(Category::Leave) || on_leave {
        return Classification::new(DayStatus::Leave, record).credit(0.0, 1.0, 0);
    }

    let worked = if label.is_day_label() {
        None
    } else {
        record.worked_hours()
    };

    match worked {
        Some(hours) if hours < 0.0 => {
            return Classification::new(DayStatus::Absent, record).credit(0.0, 0.0, 1);
        }
        Some(hours) if hours < policy.half_day_hours => {
            return Classification::new(DayStatus::Leave, record).credit(0.0, 1.0, 1);
        }
        _ => {}
    }

    match label {
        DurationLabel::Category(c @ (Category::FirstHalfDay | Category::SecondHalfDay)) => {
            return Classification::new(DayStatus::HalfDay, record)
                .credit(0.5, 0.0, 0)
                .labelled(c.to_string());
        }
        DurationLabel::Category(Category::Absent) => {
            return Classification::new(DayStatus::Absent, record).credit(0.0, 0.0, 1);
        }
        DurationLabel::Custom(name) => {
            return Classification::new(DayStatus::Holiday, record)
                .credit(1.0, 0.0, 0)
                .labelled(name.clone());
        }
        _ => {}
    }

    match worked {
        Some(hours) if hours >= policy.full_day_hours => {
            Classification::new(DayStatus::FullDay, record).credit(1.0, 0.0, 0)
        }
        Some(_) => Classification::new(DayStatus::HalfDay, record).credit(0.5, 0.5, 0),
        None if record.in_time.is_some() && record.date == today => {
            Classification::new(DayStatus::InProgress, record)
        }
        None => Classification::new(DayStatus::Absent, record).credit(0.0, 0.0, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    fn labelled(label: &str) -> DayRecord {
        DayRecord::labelled("u1", date(), DurationLabel::parse(label))
    }

    fn clocked(minutes: i64) -> DayRecord {
        DayRecord {
            user_id: "u1".to_string(),
            date: date(),
            in_time: Some(nine_am()),
            out_time: Some(nine_am() + Duration::minutes(minutes)),
            label: DurationLabel::Elapsed { minutes },
        }
    }

    fn run(record: &DayRecord) -> Classification {
        classify(Some(record), false, today(), &AttendancePolicy::default())
    }

    #[test]
    fn nine_hours_is_a_full_day() {
        let c = run(&clocked(9 * 60));
        assert_eq!(c.status, DayStatus::FullDay);
        assert_eq!(c.day_credit, 1.0);
        assert_eq!(c.hours, Some(9.0));
        assert_eq!(c.glyph(), Glyph::Present);
    }

    #[test]
    fn full_day_boundary_is_inclusive() {
        assert_eq!(run(&clocked(8 * 60 + 30)).status, DayStatus::FullDay);
        assert_eq!(run(&clocked(8 * 60 + 29)).status, DayStatus::HalfDay);
    }

    #[test]
    fn half_day_boundary_is_inclusive() {
        let c = run(&clocked(4 * 60 + 30));
        assert_eq!(c.status, DayStatus::HalfDay);
        assert_eq!(c.day_credit, 0.5);
        assert_eq!(c.leave_credit, 0.5);
        assert_eq!(c.glyph(), Glyph::Half);
    }

    #[test]
    fn short_shift_is_leave_and_counts_absent() {
        let c = run(&clocked(4 * 60 + 29));
        assert_eq!(c.status, DayStatus::Leave);
        assert_eq!(c.day_credit, 0.0);
        assert_eq!(c.leave_credit, 1.0);
        assert_eq!(c.absent_credit, 1);
    }

    #[test]
    fn weekend_offs_always_credit_a_day() {
        for label in ["Saturday Off", "Sunday Off"] {
            let mut record = labelled(label);
            record.in_time = Some(nine_am());
            record.out_time = Some(nine_am() + Duration::hours(1));

            let c = run(&record);
            assert_eq!(c.day_credit, 1.0, "{label}");
            assert_eq!(c.glyph(), Glyph::Off);

            // explicit off label beats the leave directory
            let c = classify(Some(&record), true, today(), &AttendancePolicy::default());
            assert_eq!(c.day_credit, 1.0, "{label}");
        }
    }

    #[test]
    fn leave_label_has_no_day_credit() {
        let c = run(&labelled("Leave"));
        assert_eq!(c.status, DayStatus::Leave);
        assert_eq!(c.day_credit, 0.0);
        assert_eq!(c.leave_credit, 1.0);
        assert_eq!(c.absent_credit, 0);
        assert_eq!(c.glyph(), Glyph::Leave);
    }

    #[test]
    fn leave_override_wins_over_clocked_time() {
        let c = classify(
            Some(&clocked(9 * 60)),
            true,
            today(),
            &AttendancePolicy::default(),
        );
        assert_eq!(c.status, DayStatus::Leave);
        assert_eq!(c.hours, Some(9.0));
    }

    #[test]
    fn half_day_labels_keep_their_text() {
        let c = run(&labelled("2nd Half Day"));
        assert_eq!(c.status, DayStatus::HalfDay);
        assert_eq!(c.day_credit, 0.5);
        assert_eq!(c.leave_credit, 0.0);
        assert_eq!(c.display_text(), "2nd Half Day");
    }

    #[test]
    fn custom_label_is_a_named_holiday() {
        let c = run(&labelled("Diwali"));
        assert_eq!(c.status, DayStatus::Holiday);
        assert_eq!(c.display_text(), "Diwali");
        assert_eq!(c.day_credit, 1.0);
        assert_eq!(c.glyph(), Glyph::Off);
    }

    #[test]
    fn absent_label_and_empty_record() {
        let c = run(&labelled("Absent"));
        assert_eq!(c.status, DayStatus::Absent);
        assert_eq!(c.absent_credit, 1);
        assert_eq!(c.glyph(), Glyph::Absent);

        let c = run(&labelled(""));
        assert_eq!(c.status, DayStatus::Absent);
        assert_eq!(c.glyph(), Glyph::Absent);
    }

    #[test]
    fn missing_record_renders_as_dash() {
        let c = classify(None, false, today(), &AttendancePolicy::default());
        assert_eq!(c.status, DayStatus::Absent);
        assert!(!c.has_record);
        assert_eq!(c.absent_credit, 0);
        assert_eq!(c.glyph(), Glyph::NoRecord);
    }

    #[test]
    fn reversed_times_are_absent_with_zero_hours() {
        let mut record = clocked(60);
        std::mem::swap(&mut record.in_time, &mut record.out_time);
        record.label = DurationLabel::Empty;

        let c = run(&record);
        assert_eq!(c.status, DayStatus::Absent);
        assert_eq!(c.hours, Some(0.0));
        assert_eq!(c.day_credit, 0.0);
    }

    #[test]
    fn open_shift_is_in_progress_only_today() {
        let mut record = labelled("");
        record.in_time = Some(nine_am());

        let c = run(&record);
        assert_eq!(c.status, DayStatus::Absent);
        assert_eq!(c.day_credit, 0.0);

        let c = classify(Some(&record), false, date(), &AttendancePolicy::default());
        assert_eq!(c.status, DayStatus::InProgress);
        assert_eq!(c.absent_credit, 0);
    }

    #[test]
    fn elapsed_label_without_instants_still_classifies() {
        let c = run(&labelled("9h 0m"));
        assert_eq!(c.status, DayStatus::FullDay);
        assert_eq!(c.hours, None);
    }

    #[test]
    fn thresholds_come_from_the_policy() {
        let strict = AttendancePolicy {
            full_day_hours: 9.5,
            ..AttendancePolicy::default()
        };
        let c = classify(Some(&clocked(9 * 60)), false, today(), &strict);
        assert_eq!(c.status, DayStatus::HalfDay);
    }
}
