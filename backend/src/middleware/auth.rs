//! Authentication middleware
//!
//! JWT authentication and section based access control

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::{AccessMode, Role, Section};

use crate::error::{AppError, AppResult, ErrorDetail, ErrorResponse};
use crate::services::auth::decode_access_token;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    /// Resolved role; `None` means the account has no access to any section
    pub role: Option<Role>,
}

impl AuthUser {
    pub fn can(&self, section: Section, mode: AccessMode) -> bool {
        shared::is_permitted(self.role, section, mode)
    }

    /// Fails with 403 unless the user may use `section` in `mode`
    pub fn require_section(&self, section: Section, mode: AccessMode) -> AppResult<()> {
        if self.can(section, mode) {
            Ok(())
        } else {
            tracing::debug!(
                user = %self.username,
                section = section.as_str(),
                ?mode,
                "Section access denied"
            );
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Fails with 403 unless the user holds one of `allowed`
    pub fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        if shared::role_allowed(self.role, allowed) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Manual stock adjustments are gated on role only
    pub fn require_stock_adjustment(&self) -> AppResult<()> {
        self.require_role(&shared::STOCK_ADJUSTMENT_ROLES)
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let claims = match decode_access_token(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let auth_user = AuthUser {
        user_id,
        username: claims.username,
        role: claims.role.as_deref().and_then(|r| r.parse().ok()),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message, "No autorizado"),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail::new(
                        "UNAUTHORIZED",
                        "Authentication required",
                        "Debe iniciar sesión",
                    ),
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Option<Role>) -> AuthUser {
        AuthUser {
            user_id: uuid::Uuid::new_v4(),
            username: "caja1".to_string(),
            role,
        }
    }

    #[test]
    fn test_contador_reads_but_cannot_write_inventory() {
        let contador = user(Some(Role::Contador));
        assert!(contador
            .require_section(Section::Inventario, AccessMode::Read)
            .is_ok());
        assert!(matches!(
            contador.require_section(Section::Inventario, AccessMode::Write),
            Err(AppError::InsufficientPermissions)
        ));
    }

    #[test]
    fn test_stock_adjustment_gate() {
        assert!(user(Some(Role::Administrador)).require_stock_adjustment().is_ok());
        assert!(user(Some(Role::Contador)).require_stock_adjustment().is_ok());
        assert!(matches!(
            user(Some(Role::Vendedor)).require_stock_adjustment(),
            Err(AppError::InsufficientPermissions)
        ));
        assert!(user(None).require_stock_adjustment().is_err());
    }

    #[test]
    fn test_contador_adjusts_without_ajustes_stock_section() {
        let contador = user(Some(Role::Contador));
        assert!(contador
            .require_section(Section::AjustesStock, AccessMode::Write)
            .is_err());
        assert!(contador.require_stock_adjustment().is_ok());
    }
}
