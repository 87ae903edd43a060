use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::{
    errors::AuthResult,
    models::auth::AuthenticatedUser,
    models::user::{ApiResponse, LoginData, LoginRequest, RefreshRequest, RegisterRequest, UserSummary},
    services::auth::AuthService,
    services::token::IssuedToken,
    AppState,
};

/// Extract the client address from proxy headers, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
        })
        .map(|s| s.trim().to_string())
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AuthResult<Json<ApiResponse<LoginData>>> {
    let data = AuthService::register(state.store.as_ref(), &state.config.jwt, body).await?;
    Ok(Json(ApiResponse::ok("User registered successfully", data)))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AuthResult<Json<ApiResponse<LoginData>>> {
    let data = AuthService::login(
        state.store.as_ref(),
        &state.config.jwt,
        &body.email,
        &body.password,
        client_ip(&headers),
    )
    .await?;
    Ok(Json(ApiResponse::ok("Login successful", data)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AuthResult<Json<ApiResponse<IssuedTokenBody>>> {
    let issued = AuthService::refresh(state.store.as_ref(), &state.config.jwt, &body).await?;
    Ok(Json(ApiResponse::ok(
        "Access token refreshed",
        IssuedTokenBody::from(issued),
    )))
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AuthResult<Json<ApiResponse<serde_json::Value>>> {
    let revoked = AuthService::logout(state.store.as_ref(), user.user_id).await?;
    Ok(Json(ApiResponse::ok(
        "Logged out",
        serde_json::json!({ "revoked_tokens": revoked }),
    )))
}

pub async fn user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AuthResult<Json<ApiResponse<UserSummary>>> {
    let summary = AuthService::user_by_email(state.store.as_ref(), &email).await?;
    Ok(Json(ApiResponse::ok("User found", summary)))
}

/// Serializable projection of an issued access token.
#[derive(Debug, serde::Serialize)]
pub struct IssuedTokenBody {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<IssuedToken> for IssuedTokenBody {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
        }
    }
}
