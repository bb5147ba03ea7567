use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Inclusive date range of requested leave. Only approved requests mark days as leave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[schema(example = "leave-7d3b6f2e")]
    pub id: String,

    pub user_id: String,

    #[schema(example = "2025-03-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2025-03-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    #[schema(example = "Family function", nullable = true)]
    pub reason: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,

    #[schema(example = "2025-03-01T10:00:00Z", value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// True when this is an approved request of `user_id` whose range includes `date`.
    pub fn covers(&self, user_id: &str, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved
            && self.user_id == user_id
            && self.start_date <= date
            && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: "leave-1".to_string(),
            user_id: "u1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            reason: None,
            status,
            created_at: None,
        }
    }

    #[test]
    fn approved_range_is_inclusive() {
        let leave = request(LeaveStatus::Approved);
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();

        assert!(!leave.covers("u1", day(9)));
        assert!(leave.covers("u1", day(10)));
        assert!(leave.covers("u1", day(12)));
        assert!(!leave.covers("u1", day(13)));
        assert!(!leave.covers("u2", day(11)));
    }

    #[test]
    fn pending_and_rejected_never_cover() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        assert!(!request(LeaveStatus::Pending).covers("u1", day));
        assert!(!request(LeaveStatus::Rejected).covers("u1", day));
    }

    #[test]
    fn status_string_forms() {
        assert_eq!(LeaveStatus::Approved.as_str(), "approved");
        assert_eq!("rejected".parse::<LeaveStatus>().unwrap(), LeaveStatus::Rejected);
        assert_eq!(
            serde_json::to_value(LeaveStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
        assert!(LeaveStatus::try_from("maybe".to_string()).is_err());
    }
}
