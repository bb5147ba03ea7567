use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One employee's attendance for one calendar day, as stored and exchanged.
///
/// `date` stays a string so externally supplied data with a malformed date can be
/// skipped by the report code instead of failing a whole request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "userId": "5f0c1f7e-1c1b-4a57-9c43-46a2a3d1f2b1",
    "date": "2025-03-03",
    "inTime": "2025-03-03T09:00:00Z",
    "outTime": "2025-03-03T18:00:00Z",
    "duration": "9h 0m"
}))]
pub struct AttendanceRecord {
    pub user_id: String,

    #[schema(example = "2025-03-03", format = "date")]
    pub date: String,

    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<DateTime<Utc>>,

    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<DateTime<Utc>>,

    /// Category label ("Leave", "Saturday Off", a holiday name) or elapsed time ("8h 40m")
    #[serde(default)]
    pub duration: String,
}
