use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::is_duplicate_key;
use crate::model::attendance::AttendanceRecord;
use crate::tracking::{
    Category, DurationLabel, ReportMonth, describe_shift, elapsed_minutes, format_elapsed,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

/// Column list shared by every attendance read; the date goes out as `YYYY-MM-DD`.
const SELECT_RECORDS: &str = r#"
    SELECT user_id, DATE_FORMAT(date, '%Y-%m-%d') AS date, in_time, out_time, duration
    FROM attendance
"#;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAttendance {
    #[schema(example = "5f0c1f7e-1c1b-4a57-9c43-46a2a3d1f2b1")]
    pub user_id: String,
    #[schema(example = "2025-03-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2025-03-03T09:00:00Z", format = "date-time", value_type = Option<String>)]
    pub in_time: Option<DateTime<Utc>>,
    #[schema(example = "2025-03-03T17:40:00Z", format = "date-time", value_type = Option<String>)]
    pub out_time: Option<DateTime<Utc>>,
    /// Category label or holiday name; computed from the times when omitted
    #[schema(example = "Saturday Off")]
    pub duration: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkDay {
    #[schema(example = "2025-03-08", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Saturday Off")]
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BulkKind {
    Present,
    Leave,
    SatOff,
    SunOff,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendance {
    pub employee_ids: Vec<String>,
    #[schema(example = "2025-03-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub kind: BulkKind,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Restrict to one month; requires `month` too
    pub year: Option<i32>,
    /// 1-12
    pub month: Option<u32>,
}

#[derive(Debug, PartialEq)]
struct RecordValues {
    in_time: Option<DateTime<Utc>>,
    out_time: Option<DateTime<Utc>>,
    duration: String,
}

/// Works out what gets stored for a written record.
///
/// A day label ("Leave", "Saturday Off", a holiday name) is stored as given and
/// replaces the clock instants; otherwise the elapsed time is computed from the
/// instants. Reversed instants are refused.
fn resolve_record(
    in_time: Option<DateTime<Utc>>,
    out_time: Option<DateTime<Utc>>,
    duration: Option<&str>,
) -> Result<RecordValues, &'static str> {
    let label = duration.map(DurationLabel::parse).unwrap_or(DurationLabel::Empty);

    if label.is_day_label() {
        return Ok(RecordValues {
            in_time: None,
            out_time: None,
            duration: label.to_string(),
        });
    }

    let duration = match (in_time, out_time) {
        (Some(start), Some(end)) if end < start => {
            return Err("outTime must not be earlier than inTime");
        }
        (Some(start), Some(end)) => format_elapsed(elapsed_minutes(start, end)),
        _ => label.to_string(),
    };

    Ok(RecordValues {
        in_time,
        out_time,
        duration,
    })
}

impl BulkKind {
    fn record_values(self, date: NaiveDate) -> RecordValues {
        let at = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).map(|t| date.and_time(t).and_utc());

        match self {
            BulkKind::Present => {
                let (in_time, out_time) = (at(9), at(18));
                let duration = match (in_time, out_time) {
                    (Some(start), Some(end)) => format_elapsed(elapsed_minutes(start, end)),
                    _ => String::new(),
                };
                RecordValues {
                    in_time,
                    out_time,
                    duration,
                }
            }
            BulkKind::Leave => Self::labelled(Category::Leave),
            BulkKind::SatOff => Self::labelled(Category::SaturdayOff),
            BulkKind::SunOff => Self::labelled(Category::SundayOff),
        }
    }

    fn labelled(category: Category) -> RecordValues {
        RecordValues {
            in_time: None,
            out_time: None,
            duration: category.to_string(),
        }
    }
}

async fn upsert_record<'e>(
    executor: impl sqlx::Executor<'e, Database = sqlx::MySql>,
    user_id: &str,
    date: NaiveDate,
    values: &RecordValues,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, in_time, out_time, duration)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            in_time = VALUES(in_time),
            out_time = VALUES(out_time),
            duration = VALUES(duration)
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(values.in_time)
    .bind(values.out_time)
    .bind(&values.duration)
    .execute(executor)
    .await
    .map(|_| ())
}

/// Loads attendance snapshots, optionally narrowed to one user and/or one month.
pub(crate) async fn fetch_records(
    pool: &MySqlPool,
    user_id: Option<&str>,
    month: Option<ReportMonth>,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let mut sql = format!("{} WHERE 1=1", SELECT_RECORDS);
    if user_id.is_some() {
        sql.push_str(" AND user_id = ?");
    }
    if month.is_some() {
        sql.push_str(" AND YEAR(date) = ? AND MONTH(date) = ?");
    }
    sql.push_str(" ORDER BY date DESC, user_id");

    let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql);
    if let Some(user_id) = user_id {
        query = query.bind(user_id);
    }
    if let Some(month) = month {
        query = query.bind(month.year()).bind(month.month());
    }

    query.fetch_all(pool).await
}

fn month_filter(query: &AttendanceQuery) -> actix_web::Result<Option<ReportMonth>> {
    match (query.year, query.month) {
        (Some(year), Some(month)) => ReportMonth::new(year, month)
            .map(Some)
            .map_err(actix_web::error::ErrorBadRequest),
        (None, None) => Ok(None),
        _ => Err(actix_web::error::ErrorBadRequest(
            "year and month must be given together",
        )),
    }
}

/// All attendance records (admin)
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance records, newest first", body = [AttendanceRecord]),
        (status = 400, description = "Invalid month filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let month = month_filter(&query)?;

    let records = fetch_records(pool.get_ref(), None, month).await.map_err(|e| {
        error!(error = %e, "Failed to list attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(records))
}

/// Attendance records of one employee (self or admin)
#[utoipa::path(
    get,
    path = "/api/attendance/{user_id}",
    params(
        ("user_id" = String, Path, description = "Employee id"),
        AttendanceQuery
    ),
    responses(
        (status = 200, description = "Attendance records, newest first", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn user_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(&user_id)?;

    let month = month_filter(&query)?;

    let records = fetch_records(pool.get_ref(), Some(&user_id), month)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to fetch attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(records))
}

/// Create or replace the record of one employee for one day
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = UpsertAttendance,
    responses(
        (status = 200, description = "Record saved", body = Object, example = json!({
            "message": "Attendance saved",
            "duration": "8h 40m"
        })),
        (status = 400, description = "outTime earlier than inTime"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn upsert_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_self_or_admin(&payload.user_id)?;

    let values = match resolve_record(
        payload.in_time,
        payload.out_time,
        payload.duration.as_deref(),
    ) {
        Ok(values) => values,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
        }
    };

    upsert_record(pool.get_ref(), &payload.user_id, payload.date, &values)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %payload.user_id, date = %payload.date, "Attendance upsert failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance saved",
        "duration": values.duration
    })))
}

/// Clock in for today
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    responses(
        (status = 200, description = "Clocked in", body = Object, example = json!({
            "message": "Clocked in successfully",
            "inTime": "2025-03-03T09:02:11Z"
        })),
        (status = 400, description = "Already clocked in today", body = Object, example = json!({
            "message": "Already clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, in_time, duration)
        VALUES (?, ?, ?, '')
        "#,
    )
    .bind(&auth.user_id)
    .bind(now.date_naive())
    .bind(now)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            info!(user_id = %auth.user_id, "Clocked in");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Clocked in successfully",
                "inTime": now
            })))
        }
        Err(e) if is_duplicate_key(&e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Already clocked in today"
        }))),
        Err(e) => {
            error!(error = %e, user_id = %auth.user_id, "Clock-in failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Clock out for today; stores the elapsed time and reports it against the required shift
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out", body = Object, example = json!({
            "message": "Clocked out successfully",
            "duration": "8h 40m",
            "summary": "8h 40m (-0h 20m)"
        })),
        (status = 400, description = "No open clock-in for today", body = Object, example = json!({
            "message": "No active clock-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now();
    let today = now.date_naive();

    let open = sqlx::query_as::<_, (DateTime<Utc>,)>(
        r#"
        SELECT in_time
        FROM attendance
        WHERE user_id = ? AND date = ? AND in_time IS NOT NULL AND out_time IS NULL
        "#,
    )
    .bind(&auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %auth.user_id, "Clock-out lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some((in_time,)) = open else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active clock-in found for today"
        })));
    };

    let minutes = elapsed_minutes(in_time, now);
    let values = RecordValues {
        in_time: Some(in_time),
        out_time: Some(now),
        duration: format_elapsed(minutes),
    };

    upsert_record(pool.get_ref(), &auth.user_id, today, &values)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %auth.user_id, "Clock-out failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let summary = describe_shift(minutes, config.policy.required_shift_minutes);
    debug!(user_id = %auth.user_id, summary = %summary, "Clocked out");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked out successfully",
        "duration": values.duration,
        "summary": summary
    })))
}

/// Mark one of the caller's days with a category ("Leave", "Saturday Off", ...)
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkDay,
    responses(
        (status = 200, description = "Day marked", body = Object, example = json!({
            "message": "Day marked",
            "label": "Saturday Off"
        })),
        (status = 400, description = "Unknown label"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkDay>,
) -> actix_web::Result<impl Responder> {
    let category = match DurationLabel::parse(&payload.label) {
        DurationLabel::Category(category) => category,
        _ => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "label must be one of: Leave, Saturday Off, Sunday Off, Absent, 1st Half Day, 2nd Half Day"
            })));
        }
    };

    let values = BulkKind::labelled(category);

    upsert_record(pool.get_ref(), &auth.user_id, payload.date, &values)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %auth.user_id, "Mark day failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Day marked",
        "label": values.duration
    })))
}

/// Write the same day for several employees at once (admin)
#[utoipa::path(
    post,
    path = "/api/attendance/bulk",
    request_body = BulkAttendance,
    responses(
        (status = 200, description = "Records written", body = Object, example = json!({
            "message": "Bulk attendance saved",
            "count": 3
        })),
        (status = 400, description = "No employees given"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn bulk_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BulkAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.employee_ids.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "employeeIds must not be empty"
        })));
    }

    let values = payload.kind.record_values(payload.date);

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    for user_id in &payload.employee_ids {
        upsert_record(&mut *tx, user_id, payload.date, &values)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Bulk attendance write failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit bulk attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(count = payload.employee_ids.len(), date = %payload.date, kind = ?payload.kind, "Bulk attendance saved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Bulk attendance saved",
        "count": payload.employee_ids.len()
    })))
}

/// Delete one record (admin)
#[utoipa::path(
    delete,
    path = "/api/attendance/{user_id}/{date}",
    params(
        ("user_id" = String, Path, description = "Employee id"),
        ("date" = String, Path, description = "Day as YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "message": "Attendance deleted"
        })),
        (status = 404, description = "No record for that day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(String, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (user_id, date) = path.into_inner();

    let result = sqlx::query("DELETE FROM attendance WHERE user_id = ? AND date = ?")
        .bind(&user_id)
        .bind(date)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, date = %date, "Failed to delete attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Attendance record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
    }

    #[test]
    fn elapsed_time_is_computed_from_instants() {
        let values = resolve_record(Some(at(9, 0)), Some(at(17, 40)), None).unwrap();
        assert_eq!(values.duration, "8h 40m");
    }

    #[test]
    fn reversed_instants_are_rejected() {
        assert!(resolve_record(Some(at(18, 0)), Some(at(9, 0)), None).is_err());
    }

    #[test]
    fn day_labels_win_over_instants() {
        let values =
            resolve_record(Some(at(9, 0)), Some(at(18, 0)), Some(" Saturday Off ")).unwrap();
        assert_eq!(values.duration, "Saturday Off");
        assert_eq!(values.in_time, None);
        assert_eq!(values.out_time, None);

        let values = resolve_record(Some(at(9, 0)), None, Some("Diwali")).unwrap();
        assert_eq!(values.duration, "Diwali");
        assert_eq!(values.in_time, None);

        // a label clears reversed instants instead of rejecting them
        let values = resolve_record(Some(at(18, 0)), Some(at(9, 0)), Some("Leave")).unwrap();
        assert_eq!(values.duration, "Leave");
        assert_eq!(values.out_time, None);
    }

    #[test]
    fn open_record_keeps_empty_duration() {
        let values = resolve_record(Some(at(9, 0)), None, None).unwrap();
        assert_eq!(values.duration, "");
        assert_eq!(values.out_time, None);
    }

    #[test]
    fn bulk_present_is_a_nine_hour_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let values = BulkKind::Present.record_values(date);
        assert_eq!(values.in_time, Some(at(9, 0)));
        assert_eq!(values.out_time, Some(at(18, 0)));
        assert_eq!(values.duration, "9h 0m");
    }

    #[test]
    fn bulk_off_kinds_store_category_labels() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        assert_eq!(BulkKind::Leave.record_values(date).duration, "Leave");
        assert_eq!(BulkKind::SatOff.record_values(date).duration, "Saturday Off");
        assert_eq!(BulkKind::SunOff.record_values(date).duration, "Sunday Off");
        assert_eq!(BulkKind::SunOff.record_values(date).in_time, None);
    }

    #[test]
    fn bulk_kind_uses_kebab_case() {
        let kind: BulkKind = serde_json::from_str("\"sat-off\"").unwrap();
        assert_eq!(kind, BulkKind::SatOff);
    }

    #[test]
    fn month_filter_needs_both_parts() {
        let both = AttendanceQuery {
            year: Some(2025),
            month: Some(2),
        };
        assert_eq!(
            month_filter(&both).unwrap(),
            Some(ReportMonth::new(2025, 2).unwrap())
        );

        let none = AttendanceQuery {
            year: None,
            month: None,
        };
        assert_eq!(month_filter(&none).unwrap(), None);

        let half = AttendanceQuery {
            year: Some(2025),
            month: None,
        };
        assert!(month_filter(&half).is_err());

        let bad = AttendanceQuery {
            year: Some(2025),
            month: Some(13),
        };
        assert!(month_filter(&bad).is_err());
    }
}
