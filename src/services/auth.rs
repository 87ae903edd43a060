//! Use-case orchestration: login, registration, logout, token refresh and
//! user lookups. Composes the password verifier, token issuer, refresh-token
//! lifecycle and the credential store; returns typed errors only.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::errors::{AuthError, AuthResult};
use crate::models::user::{
    LoginData, LoginHistory, LoginOutcome, RefreshRequest, RegisterRequest, User, UserSummary,
};
use crate::services::password;
use crate::services::refresh::RefreshTokenService;
use crate::services::token::{IssuedToken, TokenService};
use crate::store::CredentialStore;

pub struct AuthService;

impl AuthService {
    /// Unknown email, wrong password and inactive account all collapse into
    /// the same `InvalidCredentials` so callers cannot probe for accounts.
    pub async fn login(
        store: &dyn CredentialStore,
        jwt: &JwtSettings,
        email: &str,
        plain_password: &str,
        source_ip: Option<String>,
    ) -> AuthResult<LoginData> {
        let Some(user) = store.user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify(plain_password, &user.password_hash) {
            record_login(store, user.id, source_ip, LoginOutcome::InvalidPassword).await;
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        record_login(store, user.id, source_ip, LoginOutcome::Success).await;
        issue_session(store, jwt, user).await
    }

    /// Registers an active user and issues tokens exactly like login.
    pub async fn register(
        store: &dyn CredentialStore,
        jwt: &JwtSettings,
        request: RegisterRequest,
    ) -> AuthResult<LoginData> {
        validate_registration(&request)?;

        let colliding_email = match &request.email {
            Some(email) => store.user_by_email(email).await?.and_then(|u| u.email),
            None => None,
        };
        let colliding_username = store
            .user_by_username(&request.username)
            .await?
            .map(|u| u.username);
        if colliding_email.is_some() || colliding_username.is_some() {
            return Err(AuthError::UserAlreadyExists {
                email: colliding_email,
                username: colliding_username,
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            password_hash: password::hash(&request.password)?,
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            department_id: None,
            position_level: None,
            location_code: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        issue_session(store, jwt, user).await
    }

    /// Revokes every active refresh token of the user. Access tokens are not
    /// blacklisted; they expire on their own.
    pub async fn logout(store: &dyn CredentialStore, user_id: Uuid) -> AuthResult<u64> {
        if store.user_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound {
                identifier: user_id.to_string(),
                identifier_type: "id",
            });
        }
        RefreshTokenService::revoke_all(store, user_id).await
    }

    pub async fn refresh(
        store: &dyn CredentialStore,
        jwt: &JwtSettings,
        request: &RefreshRequest,
    ) -> AuthResult<IssuedToken> {
        RefreshTokenService::refresh_access(store, jwt, &request.token, &request.refresh_token)
            .await
    }

    pub async fn user_by_id(store: &dyn CredentialStore, id: Uuid) -> AuthResult<UserSummary> {
        let user = store
            .user_by_id(id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound {
                identifier: id.to_string(),
                identifier_type: "id",
            })?;
        summarize(store, user).await
    }

    pub async fn user_by_email(store: &dyn CredentialStore, email: &str) -> AuthResult<UserSummary> {
        let user = store
            .user_by_email(email)
            .await?
            .ok_or_else(|| AuthError::UserNotFound {
                identifier: email.to_string(),
                identifier_type: "email",
            })?;
        summarize(store, user).await
    }

    pub async fn user_by_username(
        store: &dyn CredentialStore,
        username: &str,
    ) -> AuthResult<UserSummary> {
        let user =
            store
                .user_by_username(username)
                .await?
                .ok_or_else(|| AuthError::UserNotFound {
                    identifier: username.to_string(),
                    identifier_type: "username",
                })?;
        summarize(store, user).await
    }

    /// Phone numbers are not indexed; fail loudly instead of pretending.
    pub async fn user_by_phone(_store: &dyn CredentialStore, _phone: &str) -> AuthResult<UserSummary> {
        Err(AuthError::NotImplemented("phone lookup"))
    }
}

async fn issue_session(
    store: &dyn CredentialStore,
    jwt: &JwtSettings,
    user: User,
) -> AuthResult<LoginData> {
    let roles = role_names(store, user.id).await?;
    let issued = TokenService::issue_access_token(jwt, &user, &roles)?;
    let refresh_token = RefreshTokenService::issue_or_rotate(store, jwt, user.id).await?;

    Ok(LoginData {
        user: UserSummary::from_user(user, roles),
        token: issued.token,
        refresh_token,
        expires_at: issued.expires_at,
    })
}

async fn summarize(store: &dyn CredentialStore, user: User) -> AuthResult<UserSummary> {
    let roles = role_names(store, user.id).await?;
    Ok(UserSummary::from_user(user, roles))
}

async fn role_names(store: &dyn CredentialStore, user_id: Uuid) -> AuthResult<Vec<String>> {
    let roles = store.roles_for_user(user_id).await?;
    Ok(roles.into_iter().map(|r| r.name).collect())
}

/// Best-effort append; a history failure never fails the login itself.
async fn record_login(
    store: &dyn CredentialStore,
    user_id: Uuid,
    source_ip: Option<String>,
    outcome: LoginOutcome,
) {
    let entry = LoginHistory {
        id: Uuid::new_v4(),
        user_id,
        login_at: Utc::now(),
        ip_address: source_ip,
        outcome: outcome.as_str().to_string(),
    };
    if let Err(e) = store.record_login(&entry).await {
        tracing::warn!(error = %e, %user_id, "failed to record login history");
    }
}

fn validate_registration(request: &RegisterRequest) -> AuthResult<()> {
    let mut errors: HashMap<String, Vec<String>> = HashMap::new();
    let mut add = |field: &str, message: &str| {
        errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    };

    if request.username.trim().is_empty() {
        add("username", "username is required");
    } else if request.username.len() > 50 {
        add("username", "username must be at most 50 characters");
    }
    if request.password.len() < 8 {
        add("password", "password must be at least 8 characters");
    }
    if request.full_name.trim().is_empty() {
        add("full_name", "full name is required");
    }
    if let Some(email) = &request.email {
        if !email.contains('@') {
            add("email", "email is not valid");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation {
            message: "Validation failed".to_string(),
            errors,
        })
    }
}
