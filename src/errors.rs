use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

pub type AuthResult<T> = Result<T, AuthError>;

/// Domain error taxonomy. Internal layers return these as values; the single
/// place they become HTTP responses is [`IntoResponse`] below.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: HashMap<String, Vec<String>>,
    },

    #[error("user not found with {identifier_type}: {identifier}")]
    UserNotFound {
        identifier: String,
        identifier_type: &'static str,
    },

    /// Deliberately identical for unknown email and wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user already exists")]
    UserAlreadyExists {
        email: Option<String>,
        username: Option<String>,
    },

    /// Carries a reason, never the raw token.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// Unclassified domain failure.
    #[error("{0}")]
    Auth(String),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn validation(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        AuthError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation { .. } => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserAlreadyExists { .. } => StatusCode::CONFLICT,
            AuthError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            AuthError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AuthError::Auth(_) => StatusCode::BAD_REQUEST,
            AuthError::Store(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Validation { .. } => "VALIDATION_ERROR",
            AuthError::UserNotFound { .. } => "USER_NOT_FOUND",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserAlreadyExists { .. } => "USER_ALREADY_EXISTS",
            AuthError::InvalidToken { .. } => "INVALID_TOKEN",
            AuthError::NotImplemented(_) => "NOT_IMPLEMENTED",
            AuthError::Auth(_) => "AUTH_ERROR",
            AuthError::Store(_) | AuthError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Wire shape for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub error_code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Full context lands in the server log; the body stays sanitized.
        let detail = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %detail, error_code, "request failed");
        } else {
            tracing::warn!(error = %detail, error_code, "request rejected");
        }

        let mut body = ErrorBody {
            status_code: status.as_u16(),
            error_code,
            message: self.to_string(),
            errors: None,
            identifier: None,
            identifier_type: None,
            email: None,
            username: None,
            timestamp: Utc::now(),
        };

        match self {
            AuthError::Validation { errors, .. } => body.errors = Some(errors),
            AuthError::UserNotFound {
                identifier,
                identifier_type,
            } => {
                body.identifier = Some(identifier);
                body.identifier_type = Some(identifier_type.to_string());
            }
            AuthError::UserAlreadyExists { email, username } => {
                body.email = email;
                body.username = username;
            }
            // Internal detail never reaches the caller.
            AuthError::Store(_) | AuthError::Internal(_) => {
                body.message = "An unexpected error occurred.".to_string();
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
