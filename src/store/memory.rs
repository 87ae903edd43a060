//! In-memory [`CredentialStore`] used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::user::{LoginHistory, RefreshToken, Role, User};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    roles: HashMap<Uuid, Vec<Role>>,
    tokens: Vec<RefreshToken>,
    history: Vec<LoginHistory>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_role(&self, user_id: Uuid, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .roles
            .entry(user_id)
            .or_default()
            .push(Role {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: None,
                is_system: false,
                is_active: true,
                created_at: Utc::now(),
            });
    }

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn token_count(&self) -> usize {
        self.inner.lock().unwrap().tokens.len()
    }

    pub fn login_outcomes(&self, user_id: Uuid) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .map(|h| h.outcome.clone())
            .collect()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.lock().unwrap().users.push(user.clone());
        Ok(())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .get(&user_id)
            .map(|roles| roles.iter().filter(|r| r.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn current_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .max_by_key(|t| t.issued_at)
            .cloned())
    }

    async fn refresh_token_by_value(
        &self,
        value: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tokens.iter().find(|t| t.token == value).cloned())
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        self.inner.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        new_value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.tokens.iter_mut().find(|t| t.id == id) {
            row.token = new_value.to_string();
            row.issued_at = Utc::now();
            row.expires_at = expires_at;
            row.revoked_at = None;
        }
        Ok(())
    }

    async fn revoke_refresh_token(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner
            .tokens
            .iter_mut()
            .find(|t| t.id == id && t.revoked_at.is_none())
        {
            row.revoked_at = Some(at);
        }
        Ok(())
    }

    async fn revoke_all_refresh_tokens(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut changed = 0;
        for row in inner
            .tokens
            .iter_mut()
            .filter(|t| t.user_id == user_id && t.revoked_at.is_none() && t.expires_at > at)
        {
            row.revoked_at = Some(at);
            changed += 1;
        }
        Ok(changed)
    }

    async fn record_login(&self, entry: &LoginHistory) -> Result<(), StoreError> {
        self.inner.lock().unwrap().history.push(entry.clone());
        Ok(())
    }
}
