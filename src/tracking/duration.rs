use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use strum_macros::{AsRefStr, Display, EnumString};

use super::shift::format_elapsed;

static ELAPSED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)h\s*(\d+)m$").expect("elapsed pattern is valid"));

/// Fixed, non-time labels an attendance day can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
pub enum Category {
    #[strum(serialize = "Leave")]
    Leave,
    #[strum(serialize = "Saturday Off")]
    SaturdayOff,
    #[strum(serialize = "Sunday Off")]
    SundayOff,
    #[strum(serialize = "Absent")]
    Absent,
    #[strum(serialize = "1st Half Day")]
    FirstHalfDay,
    #[strum(serialize = "2nd Half Day")]
    SecondHalfDay,
}

/// The `duration` field of a record, parsed once.
///
/// Raw records carry either a category ("Leave", "Saturday Off", ...), an
/// elapsed time ("8h 40m") or an arbitrary holiday name ("Diwali").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationLabel {
    Empty,
    Category(Category),
    Elapsed { minutes: i64 },
    Custom(String),
}

impl DurationLabel {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "-" {
            return DurationLabel::Empty;
        }
        if let Ok(category) = Category::from_str(raw) {
            return DurationLabel::Category(category);
        }
        if let Some(caps) = ELAPSED_PATTERN.captures(raw) {
            let hours = caps[1].parse::<i64>();
            let minutes = caps[2].parse::<i64>();
            if let (Ok(h), Ok(m)) = (hours, minutes) {
                return DurationLabel::Elapsed {
                    minutes: h.saturating_mul(60).saturating_add(m),
                };
            }
        }
        DurationLabel::Custom(raw.to_string())
    }

    pub fn is_category(&self, category: Category) -> bool {
        matches!(self, DurationLabel::Category(c) if *c == category)
    }

    /// A label that replaces clock times (everything except elapsed time and empty).
    pub fn is_day_label(&self) -> bool {
        matches!(self, DurationLabel::Category(_) | DurationLabel::Custom(_))
    }
}

impl From<Category> for DurationLabel {
    fn from(category: Category) -> Self {
        DurationLabel::Category(category)
    }
}

impl fmt::Display for DurationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationLabel::Empty => Ok(()),
            DurationLabel::Category(c) => write!(f, "{}", c),
            DurationLabel::Elapsed { minutes } => f.write_str(&format_elapsed(*minutes)),
            DurationLabel::Custom(label) => f.write_str(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_category_labels() {
        assert_eq!(
            DurationLabel::parse("Saturday Off"),
            DurationLabel::Category(Category::SaturdayOff)
        );
        assert_eq!(
            DurationLabel::parse("1st Half Day"),
            DurationLabel::Category(Category::FirstHalfDay)
        );
        assert_eq!(
            DurationLabel::parse(" Leave "),
            DurationLabel::Category(Category::Leave)
        );
    }

    #[test]
    fn parses_elapsed_time() {
        assert_eq!(
            DurationLabel::parse("9h 0m"),
            DurationLabel::Elapsed { minutes: 540 }
        );
        assert_eq!(
            DurationLabel::parse("8h40m"),
            DurationLabel::Elapsed { minutes: 520 }
        );
    }

    #[test]
    fn anything_else_is_a_custom_holiday_name() {
        assert_eq!(
            DurationLabel::parse("Diwali"),
            DurationLabel::Custom("Diwali".to_string())
        );
        // case matters for categories
        assert_eq!(
            DurationLabel::parse("leave"),
            DurationLabel::Custom("leave".to_string())
        );
        assert_eq!(
            DurationLabel::parse("about 9h 0m"),
            DurationLabel::Custom("about 9h 0m".to_string())
        );
    }

    #[test]
    fn blank_and_dash_are_empty() {
        assert_eq!(DurationLabel::parse(""), DurationLabel::Empty);
        assert_eq!(DurationLabel::parse("   "), DurationLabel::Empty);
        assert_eq!(DurationLabel::parse("-"), DurationLabel::Empty);
    }

    #[test]
    fn display_restores_the_wire_text() {
        assert_eq!(DurationLabel::parse("Sunday Off").to_string(), "Sunday Off");
        assert_eq!(DurationLabel::parse("8h40m").to_string(), "8h 40m");
        assert_eq!(DurationLabel::Empty.to_string(), "");
    }
}
