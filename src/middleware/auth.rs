use axum::{extract::FromRequestParts, http::request::Parts};

use crate::config::JwtSettings;
use crate::errors::AuthError;
use crate::models::auth::AuthenticatedUser;
use crate::services::token::TokenService;

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::InvalidToken {
                reason: "missing Authorization header".to_string(),
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::InvalidToken {
                reason: "Authorization header is not a bearer token".to_string(),
            })?;

        let jwt = parts
            .extensions
            .get::<JwtSettings>()
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("JWT settings not configured")))?;

        // Strict path: expired tokens are rejected here, refresh is elsewhere.
        let claims = TokenService::validate_access_token(jwt, token)?;

        let user_id = claims.sub.parse().map_err(|_| AuthError::InvalidToken {
            reason: "subject claim is not a valid user id".to_string(),
        })?;

        Ok(AuthenticatedUser {
            user_id,
            username: claims.unique_name,
            roles: claims.roles,
        })
    }
}
