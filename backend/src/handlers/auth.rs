//! Authentication and user account handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::{AccessMode, Section};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{
    AuthTokens, CreateUserInput, LoginInput, RefreshInput, RegisterInput, SessionInfo,
    UserAccount,
};
use crate::services::AuthService;
use crate::AppState;

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(body).await?;
    Ok(Json(tokens))
}

/// Token refresh endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.refresh_token(body).await?;
    Ok(Json(tokens))
}

/// Self registration; the new account has no role until an administrator
/// assigns one
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<UserAccount>)> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let user = auth_service.register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Current user, role and permitted sections
pub async fn me(current_user: CurrentUser) -> Json<SessionInfo> {
    Json(AuthService::session(&current_user.0))
}

pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<UserAccount>>> {
    current_user
        .0
        .require_section(Section::Usuarios, AccessMode::Read)?;
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    Ok(Json(auth_service.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<UserAccount>)> {
    current_user
        .0
        .require_section(Section::Usuarios, AccessMode::Write)?;
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let user = auth_service.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
