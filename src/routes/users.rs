use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    errors::{AuthError, AuthResult},
    models::auth::AuthenticatedUser,
    models::user::{ApiResponse, UserSummary},
    services::auth::AuthService,
    AppState,
};

pub async fn by_id(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> AuthResult<Json<ApiResponse<UserSummary>>> {
    let id: Uuid = user_id
        .parse()
        .map_err(|_| AuthError::validation("user_id", "must be a valid UUID"))?;
    let summary = AuthService::user_by_id(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::ok("User found", summary)))
}

pub async fn by_email(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(email): Path<String>,
) -> AuthResult<Json<ApiResponse<UserSummary>>> {
    let summary = AuthService::user_by_email(state.store.as_ref(), &email).await?;
    Ok(Json(ApiResponse::ok("User found", summary)))
}

pub async fn by_username(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(username): Path<String>,
) -> AuthResult<Json<ApiResponse<UserSummary>>> {
    let summary = AuthService::user_by_username(state.store.as_ref(), &username).await?;
    Ok(Json(ApiResponse::ok("User found", summary)))
}

pub async fn by_phone(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(phone): Path<String>,
) -> AuthResult<Json<ApiResponse<UserSummary>>> {
    let summary = AuthService::user_by_phone(state.store.as_ref(), &phone).await?;
    Ok(Json(ApiResponse::ok("User found", summary)))
}
