use crate::auth::auth::AuthUser;
use crate::db::is_duplicate_key;
use crate::model::holiday::Holiday;
use crate::tracking::{DurationLabel, ReportMonth};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2025-10-20", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Diwali")]
    pub name: String,
    #[schema(example = "Festival of lights")]
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HolidayQuery {
    pub year: Option<i32>,
}

/// A holiday name is stored as a day label, so it must not read as a category or a time.
fn validate_name(name: &str) -> Result<&str, &'static str> {
    let name = name.trim();
    match DurationLabel::parse(name) {
        DurationLabel::Custom(_) => Ok(name),
        DurationLabel::Empty => Err("name must not be empty"),
        _ => Err("name must not be an attendance label or a duration"),
    }
}

/// Holidays falling inside `month`.
pub(crate) async fn fetch_month_holidays(
    pool: &MySqlPool,
    month: ReportMonth,
) -> Result<Vec<Holiday>, sqlx::Error> {
    sqlx::query_as::<_, Holiday>(
        r#"
        SELECT date, name, description
        FROM holidays
        WHERE YEAR(date) = ? AND MONTH(date) = ?
        ORDER BY date
        "#,
    )
    .bind(month.year())
    .bind(month.month())
    .fetch_all(pool)
    .await
}

/// List holidays
#[utoipa::path(
    get,
    path = "/api/holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays in date order", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = match query.year {
        Some(year) => {
            sqlx::query_as::<_, Holiday>(
                "SELECT date, name, description FROM holidays WHERE YEAR(date) = ? ORDER BY date",
            )
            .bind(year)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Holiday>(
                "SELECT date, name, description FROM holidays ORDER BY date",
            )
            .fetch_all(pool.get_ref())
            .await
        }
    }
    .map_err(|e| {
        error!(error = %e, "Failed to list holidays");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Declare a holiday (admin)
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Holiday),
        (status = 400, description = "Invalid name or a holiday already exists on that date", body = Object, example = json!({
            "message": "A holiday already exists on 2025-10-20"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = match validate_name(&payload.name) {
        Ok(name) => name,
        Err(msg) => return Ok(HttpResponse::BadRequest().json(json!({ "message": msg }))),
    };

    let holiday = Holiday {
        date: payload.date,
        name: name.to_string(),
        description: payload
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    };

    let result = sqlx::query("INSERT INTO holidays (date, name, description) VALUES (?, ?, ?)")
        .bind(holiday.date)
        .bind(&holiday.name)
        .bind(&holiday.description)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            info!(date = %holiday.date, name = %holiday.name, "Holiday created");
            Ok(HttpResponse::Created().json(holiday))
        }
        Err(e) if is_duplicate_key(&e) => Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("A holiday already exists on {}", holiday.date)
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create holiday");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Remove a holiday (admin)
#[utoipa::path(
    delete,
    path = "/api/holidays/{date}",
    params(
        ("date" = String, Path, description = "Day as YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Holiday removed", body = Object, example = json!({
            "message": "Holiday deleted"
        })),
        (status = 404, description = "No holiday on that date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = path.into_inner();

    let result = sqlx::query("DELETE FROM holidays WHERE date = ?")
        .bind(date)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, date = %date, "Failed to delete holiday");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Holiday not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Holiday deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holiday_names_are_trimmed() {
        assert_eq!(validate_name("  Diwali "), Ok("Diwali"));
        assert_eq!(validate_name("Republic Day"), Ok("Republic Day"));
    }

    #[test]
    fn names_that_read_as_labels_are_refused() {
        assert!(validate_name("").is_err());
        assert!(validate_name(" - ").is_err());
        assert!(validate_name("Leave").is_err());
        assert!(validate_name("Sunday Off").is_err());
        assert!(validate_name("8h 30m").is_err());
    }
}
