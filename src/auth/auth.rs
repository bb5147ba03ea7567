use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    /// employee id
    pub user_id: String,
    pub mobile: String,
    pub role: Role,
}

impl AuthUser {
    fn from_token(token: &str, secret: &str) -> actix_web::Result<Self> {
        let claims = verify_token(token, secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;

        if claims.token_type != TokenType::Access {
            return Err(ErrorUnauthorized("Access token required"));
        }

        let role = Role::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            mobile: claims.sub,
            role,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already verified by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        ready(AuthUser::from_token(token, &config.jwt_secret))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Employees may act on their own data; admins on anyone's.
    pub fn require_self_or_admin(&self, user_id: &str) -> actix_web::Result<()> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not allowed for this employee"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};

    const SECRET: &str = "test-secret";

    #[test]
    fn access_token_becomes_auth_user() {
        let token = generate_access_token("emp-1", "9876543210", 1, SECRET, 60).unwrap();
        let user = AuthUser::from_token(&token, SECRET).unwrap();

        assert_eq!(user.user_id, "emp-1");
        assert_eq!(user.role, Role::Admin);
        assert!(user.require_admin().is_ok());
    }

    #[test]
    fn refresh_token_is_not_accepted_for_api_calls() {
        let (token, _) = generate_refresh_token("emp-1", "9876543210", 2, SECRET, 60).unwrap();
        assert!(AuthUser::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn employees_only_touch_their_own_data() {
        let user = AuthUser {
            user_id: "emp-1".to_string(),
            mobile: "9876543210".to_string(),
            role: Role::Employee,
        };

        assert!(user.require_self_or_admin("emp-1").is_ok());
        assert!(user.require_self_or_admin("emp-2").is_err());
        assert!(user.require_admin().is_err());
    }

    #[actix_web::test]
    async fn extractor_reads_user_set_by_middleware() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthUser {
            user_id: "emp-7".to_string(),
            mobile: "9876543210".to_string(),
            role: Role::Employee,
        });

        let user = AuthUser::from_request(&req, &mut Payload::None).await.unwrap();
        assert_eq!(user.user_id, "emp-7");
        assert_eq!(user.role, Role::Employee);
    }

    #[actix_web::test]
    async fn extractor_without_user_or_token_is_unauthorized() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let err = AuthUser::from_request(&req, &mut Payload::None).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
    }
}
