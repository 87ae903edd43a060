//! Persistence seam for the auth service. Production uses [`postgres::PgStore`];
//! tests substitute an in-memory implementation.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{LoginHistory, RefreshToken, Role, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database operation failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Lookup and mutation surface over users, roles and refresh tokens. Absence is
/// expressed as `Ok(None)`, never as an error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Active roles granted to the user, for claim construction.
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError>;

    /// The newest refresh-token row for the user, active or not.
    async fn current_refresh_token(&self, user_id: Uuid)
        -> Result<Option<RefreshToken>, StoreError>;
    async fn refresh_token_by_value(&self, value: &str)
        -> Result<Option<RefreshToken>, StoreError>;
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError>;
    /// Rotation-by-update: new value + expiry on the existing row, revocation cleared.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        new_value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
    /// Revokes every active token of the user; returns how many rows changed.
    async fn revoke_all_refresh_tokens(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn record_login(&self, entry: &LoginHistory) -> Result<(), StoreError>;
}
