use crate::api::attendance::fetch_records;
use crate::api::employee::fetch_all_employees;
use crate::api::holiday::fetch_month_holidays;
use crate::api::leave_request::fetch_approved_leaves;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::{attendance::AttendanceRecord, holiday::Holiday, leave_request::LeaveRequest};
use crate::tracking::{
    AttendancePolicy, DetailRow, GridRow, MonthlySummary, ReportContext, ReportMonth, build_grid,
    detailed_listing, summarize_month,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MonthlyQuery {
    /// Defaults to the caller
    pub user_id: Option<String>,
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub rows: Vec<GridRow>,
}

/// Everything a month's report reads, loaded up front so the core works on a snapshot.
struct MonthSnapshot {
    records: Vec<AttendanceRecord>,
    leaves: Vec<LeaveRequest>,
    holidays: Vec<Holiday>,
}

impl MonthSnapshot {
    async fn load(
        pool: &MySqlPool,
        month: ReportMonth,
        user_id: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let (first, last) = match (month.date_for_day(1), month.date_for_day(month.days())) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(sqlx::Error::Protocol(format!("unrepresentable month {:?}", month))),
        };

        let records = fetch_records(pool, user_id, Some(month)).await?;
        let leaves = fetch_approved_leaves(pool, first, last).await?;
        let holidays = fetch_month_holidays(pool, month).await?;

        debug!(
            records = records.len(),
            leaves = leaves.len(),
            holidays = holidays.len(),
            "Loaded month snapshot"
        );

        Ok(Self {
            records,
            leaves,
            holidays,
        })
    }

    fn context(&self, today: NaiveDate, policy: AttendancePolicy) -> ReportContext<'_> {
        ReportContext::new(today, policy)
            .with_leaves(&self.leaves)
            .with_holidays(&self.holidays)
    }
}

/// The requested month, or the one containing `today` when neither part is given.
fn report_month(
    year: Option<i32>,
    month: Option<u32>,
    today: NaiveDate,
) -> actix_web::Result<ReportMonth> {
    match (year, month) {
        (Some(year), Some(month)) => {
            ReportMonth::new(year, month).map_err(actix_web::error::ErrorBadRequest)
        }
        (None, None) => Ok(ReportMonth::of(today)),
        _ => Err(actix_web::error::ErrorBadRequest(
            "year and month must be given together",
        )),
    }
}

fn snapshot_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Failed to load report data");
    ErrorInternalServerError("Internal Server Error")
}

/// Monthly summary of one employee (self or admin)
#[utoipa::path(
    get,
    path = "/api/reports/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Per-day statuses with present/leave/absent totals", body = MonthlySummary),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn monthly_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthlyQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = query.user_id.clone().unwrap_or_else(|| auth.user_id.clone());
    auth.require_self_or_admin(&user_id)?;

    let today = Utc::now().date_naive();
    let month = report_month(query.year, query.month, today)?;

    let snapshot = MonthSnapshot::load(pool.get_ref(), month, Some(&user_id))
        .await
        .map_err(snapshot_error)?;

    let context = snapshot.context(today, config.policy);
    let summary: MonthlySummary = summarize_month(&user_id, &snapshot.records, &context, month);

    Ok(HttpResponse::Ok().json(summary))
}

/// Employee x day matrix for a month (admin)
#[utoipa::path(
    get,
    path = "/api/reports/grid",
    params(MonthQuery),
    responses(
        (status = 200, description = "One row per employee with a glyph per day", body = GridResponse),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn grid_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = Utc::now().date_naive();
    let month = report_month(query.year, query.month, today)?;

    let employees = fetch_all_employees(pool.get_ref())
        .await
        .map_err(snapshot_error)?;
    let snapshot = MonthSnapshot::load(pool.get_ref(), month, None)
        .await
        .map_err(snapshot_error)?;

    let context = snapshot.context(today, config.policy);
    let rows = build_grid(&employees, &snapshot.records, &context, month);

    Ok(HttpResponse::Ok().json(GridResponse {
        year: month.year(),
        month: month.month(),
        days_in_month: month.days(),
        rows,
    }))
}

/// Every record of a month, newest first (admin)
#[utoipa::path(
    get,
    path = "/api/reports/detailed",
    params(MonthQuery),
    responses(
        (status = 200, description = "Records sorted by date descending, then name", body = [DetailRow]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn detailed_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = Utc::now().date_naive();
    let month = report_month(query.year, query.month, today)?;

    let employees = fetch_all_employees(pool.get_ref())
        .await
        .map_err(snapshot_error)?;
    let snapshot = MonthSnapshot::load(pool.get_ref(), month, None)
        .await
        .map_err(snapshot_error)?;

    let context = snapshot.context(today, config.policy);
    let rows = detailed_listing(&employees, &snapshot.records, &context, month);

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_outside_range_is_a_bad_request() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert!(report_month(Some(2025), Some(0), today).is_err());
        assert!(report_month(Some(2025), Some(13), today).is_err());
        assert!(report_month(None, Some(3), today).is_err());
        assert_eq!(report_month(Some(2024), Some(2), today).unwrap().days(), 29);
    }

    #[test]
    fn missing_month_means_the_current_one() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let month = report_month(None, None, today).unwrap();
        assert_eq!((month.year(), month.month()), (2025, 3));
    }

    #[test]
    fn snapshot_context_sees_leaves_and_holidays() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let snapshot = MonthSnapshot {
            records: Vec::new(),
            leaves: Vec::new(),
            holidays: vec![Holiday {
                date,
                name: "Diwali".to_string(),
                description: None,
            }],
        };

        let context = snapshot.context(date, AttendancePolicy::default());
        assert_eq!(context.holiday_name(date), Some("Diwali"));
        assert!(!context.is_on_leave("u1", date));
    }
}
