use crate::core::AppError;
use crate::modules::users::models::UserRole;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::str::FromStr;

/// Authenticated user resolved from a bearer token.
///
/// Inserted into request extensions by [`BearerAuth`]; handlers receive it
/// through the `FromRequest` impl below.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(|| Error::from(AppError::unauthorized("Authentication required"))),
        )
    }
}

/// Extractor that additionally requires the admin (reviewer) role
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| Error::from(AppError::unauthorized("Authentication required")))
            .and_then(|user| {
                if user.is_admin() {
                    Ok(AdminUser(user))
                } else {
                    Err(Error::from(AppError::forbidden(
                        "Admin role required for this operation",
                    )))
                }
            });
        ready(result)
    }
}

/// Paths reachable without a token: health, auth bootstrap, gateway
/// webhooks, and read-only catalog browsing. A presented token is still
/// resolved on these paths so admin callers keep their role.
fn is_public(method: &actix_web::http::Method, path: &str) -> bool {
    use actix_web::http::Method;

    if path == "/" || path == "/health" {
        return true;
    }
    if path.starts_with("/auth/") || path.starts_with("/payments/") {
        return true;
    }

    *method == Method::GET
        && (path.starts_with("/products") || path.starts_with("/brands")
            || path.starts_with("/categories"))
}

/// Bearer token authentication middleware.
///
/// Applied app-wide; public paths pass through without a token, everything
/// else requires a live access token.
pub struct BearerAuth {
    pool: MySqlPool,
}

impl BearerAuth {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    pool: MySqlPool,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let pool = self.pool.clone();

        Box::pin(async move {
            let public = is_public(req.method(), req.path());

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string());

            match token {
                Some(token) => match resolve_access_token(&pool, &token).await {
                    Ok(user) => {
                        req.extensions_mut().insert(user);
                    }
                    Err(e) if public => {
                        tracing::debug!(error = %e, "Ignoring invalid token on public path");
                    }
                    Err(e) => return Err(Error::from(e)),
                },
                None if public => {}
                None => {
                    return Err(Error::from(AppError::unauthorized(
                        "Missing Authorization bearer token",
                    )))
                }
            }

            svc.call(req).await
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenUserRow {
    user_id: String,
    email: String,
    full_name: String,
    role: String,
}

async fn resolve_access_token(pool: &MySqlPool, token: &str) -> crate::core::Result<CurrentUser> {
    let token_hash = hash_token(token);

    let row = sqlx::query_as::<_, TokenUserRow>(
        r#"
        SELECT t.user_id, u.email, u.full_name, u.role
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.access_token_hash = ?
          AND t.revoked = FALSE
          AND t.access_expires_at > NOW()
          AND u.is_active = TRUE
        LIMIT 1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

    let role = UserRole::from_str(&row.role)
        .map_err(|e| AppError::internal(format!("Invalid role in database: {}", e)))?;

    Ok(CurrentUser {
        id: row.user_id,
        email: row.email,
        full_name: row.full_name,
        role,
    })
}

/// SHA-256 digest of a token, hex-encoded; tokens are never stored verbatim
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic_and_hex() {
        let a = hash_token("token-123");
        let b = hash_token("token-123");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_differs_per_token() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn test_public_path_matrix() {
        use actix_web::http::Method;

        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/auth/login"));
        assert!(is_public(&Method::POST, "/payments/success"));
        assert!(is_public(&Method::GET, "/products"));
        assert!(is_public(&Method::GET, "/products/napa-500"));
        assert!(is_public(&Method::GET, "/categories"));

        assert!(!is_public(&Method::POST, "/products"));
        assert!(!is_public(&Method::PATCH, "/products/abc"));
        assert!(!is_public(&Method::GET, "/cart"));
        assert!(!is_public(&Method::POST, "/orders"));
        assert!(!is_public(&Method::GET, "/reports/monthly"));
    }
}
