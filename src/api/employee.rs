use crate::{
    auth::{auth::AuthUser, password::hash_password},
    db::is_duplicate_key,
    model::{
        employee::{Employee, is_valid_mobile, normalize_mobile},
        role::Role,
    },
    utils::{mobile_cache, mobile_filter},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "Asha Patel")]
    pub name: String,
    #[schema(example = "9876543210")]
    pub mobile: String,
    #[schema(example = "s3cret")]
    pub password: String,
    /// 1 = admin, 2 = employee (default)
    #[schema(example = 2)]
    pub role_id: Option<u8>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<u8>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Matches name or mobile
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Checked, normalized fields of an update. `None` leaves the column as is.
#[derive(Debug, Default, PartialEq)]
struct EmployeeChanges {
    name: Option<String>,
    mobile: Option<String>,
    role_id: Option<u8>,
}

fn validate_changes(body: &UpdateEmployee) -> Result<EmployeeChanges, &'static str> {
    let name = match body.name.as_deref().map(str::trim) {
        Some("") => return Err("name must not be empty"),
        other => other.map(str::to_string),
    };

    let mobile = match body.mobile.as_deref().map(normalize_mobile) {
        Some(m) if !is_valid_mobile(&m) => return Err("mobile must have exactly 10 digits"),
        other => other,
    };

    if let Some(role_id) = body.role_id {
        Role::from_id(role_id).ok_or("unknown role")?;
    }

    if matches!(body.password.as_deref(), Some("")) {
        return Err("password must not be empty");
    }

    Ok(EmployeeChanges {
        name,
        mobile,
        role_id: body.role_id,
    })
}

async fn current_mobile(pool: &MySqlPool, employee_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT mobile FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "id": "5f0c1f7e-1c1b-4a57-9c43-46a2a3d1f2b1"
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Mobile number already registered"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Something went wrong, Contact with system admin"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    let mobile = normalize_mobile(&payload.mobile);
    let role = Role::from_id(payload.role_id.unwrap_or(Role::Employee.id()));

    let role = match role {
        Some(role) if !name.is_empty() && !payload.password.is_empty() && is_valid_mobile(&mobile) => role,
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "name, password, a 10 digit mobile and a known role are required"
            })));
        }
    };

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let id = Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO employees (id, name, mobile, password, role_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(&mobile)
    .bind(hashed)
    .bind(role.id())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            mobile_filter::insert(&mobile);
            mobile_cache::mark_taken(&mobile).await;
            info!(employee_id = %id, "Employee created");
            Ok(HttpResponse::Created().json(json!({
                "message": "Employee created successfully",
                "id": id
            })))
        }
        Err(e) if is_duplicate_key(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Mobile number already registered"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to Create Employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let like = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let where_clause = if like.is_some() {
        "WHERE name LIKE ? OR mobile LIKE ?"
    } else {
        ""
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(like) = &like {
        count_query = count_query.bind(like).bind(like);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT id, name, mobile, role_id FROM employees {} ORDER BY name LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    if let Some(like) = &like {
        data_query = data_query.bind(like).bind(like);
    }

    let employees = data_query
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %data_sql, "Failed to fetch employees");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Every employee, ordered by name. Used by the report endpoints.
pub(crate) async fn fetch_all_employees(pool: &MySqlPool) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT id, name, mobile, role_id FROM employees ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 409, description = "Mobile number already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let changes = match validate_changes(&body) {
        Ok(changes) => changes,
        Err(msg) => return Ok(HttpResponse::BadRequest().json(json!({ "message": msg }))),
    };

    let old_mobile = current_mobile(pool.get_ref(), &employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = %employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(old_mobile) = old_mobile else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let hashed = match body.password.as_deref() {
        Some(password) => Some(hash_password(password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ErrorInternalServerError("Internal Server Error")
        })?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET name = COALESCE(?, name),
            mobile = COALESCE(?, mobile),
            password = COALESCE(?, password),
            role_id = COALESCE(?, role_id)
        WHERE id = ?
        "#,
    )
    .bind(&changes.name)
    .bind(&changes.mobile)
    .bind(hashed)
    .bind(changes.role_id)
    .bind(&employee_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_duplicate_key(&e) => {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "Mobile number already registered"
            })));
        }
        Err(e) => {
            error!(error = %e, employee_id = %employee_id, "Failed to update employee");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    }

    if let Some(mobile) = changes.mobile.filter(|m| *m != old_mobile) {
        mobile_filter::remove(&old_mobile);
        mobile_cache::forget(&old_mobile).await;
        mobile_filter::insert(&mobile);
        mobile_cache::mark_taken(&mobile).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let mobile = current_mobile(pool.get_ref(), &employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = %employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(&employee_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = %employee_id, "Failed to delete employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    if let Some(mobile) = mobile {
        mobile_filter::remove(&mobile);
        mobile_cache::forget(&mobile).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(&employee_id)?;

    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, mobile, role_id FROM employees WHERE id = ?",
    )
    .bind(&employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = %employee_id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> UpdateEmployee {
        UpdateEmployee {
            name: None,
            mobile: None,
            password: None,
            role_id: None,
        }
    }

    #[test]
    fn empty_update_changes_nothing() {
        assert_eq!(validate_changes(&update()).unwrap(), EmployeeChanges::default());
    }

    #[test]
    fn update_normalizes_fields() {
        let body = UpdateEmployee {
            name: Some("  Ravi ".to_string()),
            mobile: Some("98765 43210".to_string()),
            role_id: Some(1),
            ..update()
        };
        let changes = validate_changes(&body).unwrap();
        assert_eq!(changes.name.as_deref(), Some("Ravi"));
        assert_eq!(changes.mobile.as_deref(), Some("9876543210"));
        assert_eq!(changes.role_id, Some(1));
    }

    #[test]
    fn update_rejects_invalid_values() {
        let blank_name = UpdateEmployee {
            name: Some("  ".to_string()),
            ..update()
        };
        assert!(validate_changes(&blank_name).is_err());

        let short_mobile = UpdateEmployee {
            mobile: Some("12345".to_string()),
            ..update()
        };
        assert!(validate_changes(&short_mobile).is_err());

        let unknown_role = UpdateEmployee {
            role_id: Some(9),
            ..update()
        };
        assert!(validate_changes(&unknown_role).is_err());

        let empty_password = UpdateEmployee {
            password: Some(String::new()),
            ..update()
        };
        assert!(validate_changes(&empty_password).is_err());
    }
}
