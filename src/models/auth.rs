use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in the JWT access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User UUID.
    pub sub: String,
    pub unique_name: String,
    pub email: Option<String>,
    pub full_name: String,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

/// Extracted from a validated bearer token, available via axum extractors.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}
