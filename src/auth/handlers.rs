use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    db::is_duplicate_key,
    model::{
        employee::{is_valid_mobile, normalize_mobile},
        role::Role,
    },
    models::{Claims, EmployeeCredentials, LoginReqDto, RegisterReq, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::utils::mobile_cache;
use crate::utils::mobile_filter;

/// Inserts a new employee and updates the Cuckoo filter
async fn insert_employee(
    name: &str,
    mobile: &str,
    password: &str,
    pool: &MySqlPool,
) -> Result<String, HttpResponse> {
    let hashed = hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        HttpResponse::InternalServerError().json(json!({
            "error": "Failed to register employee"
        }))
    })?;

    let id = Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"INSERT INTO employees (id, name, mobile, password, role_id) VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(name)
    .bind(mobile)
    .bind(hashed)
    .bind(Role::Employee.id())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            mobile_filter::insert(mobile);
            mobile_cache::mark_taken(mobile).await;
            Ok(id)
        }
        Err(e) if is_duplicate_key(&e) => Err(HttpResponse::Conflict().json(json!({
            "error": "Mobile number already registered"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to insert employee");
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register employee"
            })))
        }
    }
}

/// true  => mobile AVAILABLE
/// false => mobile TAKEN
pub async fn is_mobile_available(mobile: &str, pool: &MySqlPool) -> bool {
    // Cuckoo filter: a miss is definitive
    if !mobile_filter::might_exist(mobile) {
        return true;
    }

    // Moka cache: a hit is definitive
    if mobile_cache::is_taken(mobile).await {
        return false;
    }

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE mobile = ? LIMIT 1)",
    )
    .bind(mobile)
    .fetch_one(pool)
    .await
    .map(|found| found != 0)
    .unwrap_or(true); // fail-safe

    if exists {
        mobile_cache::mark_taken(mobile).await;
        return false;
    }

    true
}

/// Validated registration input: trimmed name and a ten digit mobile.
fn validate_registration(req: &RegisterReq) -> Result<(String, String), &'static str> {
    let name = req.name.trim();
    if name.is_empty() || req.password.is_empty() {
        return Err("Name, mobile and password are required");
    }

    let mobile = normalize_mobile(&req.mobile);
    if !is_valid_mobile(&mobile) {
        return Err("Mobile number must have exactly 10 digits");
    }

    Ok((name.to_string(), mobile))
}

/// Employee self-registration
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Employee registered", body = Object, example = json!({
            "message": "Employee registered successfully",
            "id": "5f0c1f7e-1c1b-4a57-9c43-46a2a3d1f2b1"
        })),
        (status = 400, description = "Invalid name, mobile or password"),
        (status = 409, description = "Mobile number already registered")
    ),
    tag = "Auth"
)]
pub async fn register(req: web::Json<RegisterReq>, pool: web::Data<MySqlPool>) -> impl Responder {
    let (name, mobile) = match validate_registration(&req) {
        Ok(valid) => valid,
        Err(msg) => return HttpResponse::BadRequest().json(json!({ "error": msg })),
    };

    if !is_mobile_available(&mobile, pool.get_ref()).await {
        return HttpResponse::Conflict().json(json!({
            "error": "Mobile number already registered"
        }));
    }

    match insert_employee(&name, &mobile, &req.password, pool.get_ref()).await {
        Ok(id) => {
            info!(employee_id = %id, "Employee registered");
            HttpResponse::Created().json(json!({
                "message": "Employee registered successfully",
                "id": id
            }))
        }
        Err(err_resp) => err_resp,
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

async fn store_refresh_token(
    employee_id: &str,
    claims: &Claims,
    pool: &MySqlPool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (employee_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(employee_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Issues a fresh access/refresh pair and records the refresh token.
async fn issue_token_pair(
    employee_id: &str,
    mobile: &str,
    role: u8,
    config: &Config,
    pool: &MySqlPool,
) -> Result<LoginResponse, HttpResponse> {
    let access_token = generate_access_token(
        employee_id,
        mobile,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let refresh = generate_refresh_token(
        employee_id,
        mobile,
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    let (access_token, (refresh_token, refresh_claims)) = match (access_token, refresh) {
        (Ok(access), Ok(refresh)) => (access, refresh),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to sign tokens");
            return Err(HttpResponse::InternalServerError().finish());
        }
    };

    debug!(employee_id, jti = %refresh_claims.jti, "Storing refresh token");

    if let Err(e) = store_refresh_token(employee_id, &refresh_claims, pool).await {
        error!(error = %e, "Failed to store refresh token");
        return Err(HttpResponse::InternalServerError().finish());
    }

    Ok(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Login with mobile number and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 400, description = "Mobile or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, req),
    fields(mobile = %req.mobile)
)]
pub async fn login(
    req: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    let mobile = normalize_mobile(&req.mobile);
    if mobile.is_empty() || req.password.is_empty() {
        info!("Validation failed: empty mobile or password");
        return HttpResponse::BadRequest().body("Mobile or password required");
    }

    debug!("Fetching employee from database");

    let employee = match sqlx::query_as::<_, EmployeeCredentials>(
        r#"
        SELECT id, mobile, password, role_id
        FROM employees
        WHERE mobile = ?
        "#,
    )
    .bind(&mobile)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(employee)) => {
            debug!(employee_id = %employee.id, "Employee found");
            employee
        }
        Ok(None) => {
            info!("Invalid credentials: employee not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching employee");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&req.password, &employee.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let tokens = match issue_token_pair(
        &employee.id,
        &employee.mobile,
        employee.role_id,
        &config,
        pool.get_ref(),
    )
    .await
    {
        Ok(tokens) => tokens,
        Err(resp) => return resp,
    };

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE employees SET last_login_at = NOW() WHERE id = ?")
        .bind(&employee.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    HttpResponse::Ok().json(tokens)
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Rotate a refresh token: the presented one is revoked and a new pair issued
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // only a live token may be rotated; the update doubles as the lookup
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ? AND revoked = FALSE AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await;

    match revoked {
        Ok(res) if res.rows_affected() == 1 => {}
        Ok(_) => {
            info!(jti = %claims.jti, "Refresh token unknown or already revoked");
            return HttpResponse::Unauthorized().finish();
        }
        Err(e) => {
            error!(error = %e, "Failed to revoke refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    }

    match issue_token_pair(
        &claims.user_id,
        &claims.sub,
        claims.role,
        &config,
        pool.get_ref(),
    )
    .await
    {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(resp) => resp,
    }
}

/// Revoke a refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn req(name: &str, mobile: &str, password: &str) -> RegisterReq {
        RegisterReq {
            name: name.to_string(),
            mobile: mobile.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn registration_normalizes_mobile_and_trims_name() {
        let (name, mobile) = validate_registration(&req("  Asha  ", "98765-43210", "pw")).unwrap();
        assert_eq!(name, "Asha");
        assert_eq!(mobile, "9876543210");
    }

    #[test]
    fn registration_rejects_bad_input() {
        assert!(validate_registration(&req("", "9876543210", "pw")).is_err());
        assert!(validate_registration(&req("Asha", "9876543210", "")).is_err());
        assert!(validate_registration(&req("Asha", "12345", "pw")).is_err());
        assert!(validate_registration(&req("Asha", "+91 98765 43210", "pw")).is_err());
    }

    #[test]
    fn bearer_token_requires_prefix() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
