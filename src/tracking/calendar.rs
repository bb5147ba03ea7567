use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::TrackingError;

/// A calendar month, `month` in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, TrackingError> {
        // year must also be representable by chrono
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(_) => Ok(Self { year, month }),
            None => Err(TrackingError::InvalidMonth(month)),
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month).unwrap_or(0)
    }

    pub fn date_for_day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every date of the month in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=self.days()).filter_map(move |day| self.date_for_day(day))
    }
}

/// Real calendar length of a month, leap years included. `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

/// Parses the calendar-date part of a `date` field.
///
/// Accepts bare `YYYY-MM-DD` as well as full timestamps (`2025-03-03T00:00:00.000Z`,
/// `2025-03-03 00:00:00`); anything after the date component is ignored.
pub fn parse_date_key(raw: &str) -> Result<NaiveDate, TrackingError> {
    let trimmed = raw.trim();
    let key = trimmed
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);

    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|_| TrackingError::MalformedDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years_use_real_february_length() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), Some(31));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
        assert_eq!(days_in_month(2025, 0), None);
    }

    #[test]
    fn report_month_rejects_bad_months() {
        assert_eq!(ReportMonth::new(2025, 0), Err(TrackingError::InvalidMonth(0)));
        assert_eq!(ReportMonth::new(2025, 13), Err(TrackingError::InvalidMonth(13)));

        let feb = ReportMonth::new(2024, 2).unwrap();
        assert_eq!(feb.days(), 29);
        assert_eq!(feb.dates().count(), 29);
        assert_eq!(
            feb.date_for_day(29),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(feb.date_for_day(30), None);
    }

    #[test]
    fn date_keys_are_truncated_to_the_day() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(parse_date_key("2025-03-03"), Ok(expected));
        assert_eq!(parse_date_key("2025-03-03T18:30:00.000Z"), Ok(expected));
        assert_eq!(parse_date_key("2025-03-03 00:00:00"), Ok(expected));
    }

    #[test]
    fn garbage_dates_are_reported() {
        assert_eq!(
            parse_date_key("03/03/2025"),
            Err(TrackingError::MalformedDate("03/03/2025".to_string()))
        );
        assert!(parse_date_key("").is_err());
        assert!(parse_date_key("2025-02-30").is_err());
    }
}
