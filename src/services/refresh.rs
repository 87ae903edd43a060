//! Server-side refresh-token lifecycle. Per user the design keeps a single
//! current row: {absent, active, expired, revoked}.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::errors::{AuthError, AuthResult};
use crate::models::user::RefreshToken;
use crate::services::token::{IssuedToken, TokenService};
use crate::store::CredentialStore;

pub struct RefreshTokenService;

impl RefreshTokenService {
    /// Absent row: create one. Expired row: revoke it and create a fresh row.
    /// Otherwise the existing row is rotated in place, clearing any revocation.
    /// Returns the new opaque value.
    pub async fn issue_or_rotate(
        store: &dyn CredentialStore,
        jwt: &JwtSettings,
        user_id: Uuid,
    ) -> AuthResult<String> {
        let now = Utc::now();
        let expires_at = now + Duration::days(jwt.refresh_ttl_days);
        let value = TokenService::generate_refresh_value();

        match store.current_refresh_token(user_id).await? {
            None => {
                store
                    .insert_refresh_token(&RefreshToken {
                        id: Uuid::new_v4(),
                        user_id,
                        token: value.clone(),
                        issued_at: now,
                        expires_at,
                        revoked_at: None,
                    })
                    .await?;
            }
            Some(existing) if existing.is_expired(now) => {
                store.revoke_refresh_token(existing.id, now).await?;
                store
                    .insert_refresh_token(&RefreshToken {
                        id: Uuid::new_v4(),
                        user_id,
                        token: value.clone(),
                        issued_at: now,
                        expires_at,
                        revoked_at: None,
                    })
                    .await?;
            }
            Some(existing) => {
                store
                    .rotate_refresh_token(existing.id, &value, expires_at)
                    .await?;
            }
        }

        Ok(value)
    }

    /// Fails closed: unknown value, expiry, revocation and store failures all
    /// read as "not valid".
    pub async fn validate(store: &dyn CredentialStore, value: &str) -> bool {
        match store.refresh_token_by_value(value).await {
            Ok(Some(row)) => row.is_active(Utc::now()),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "refresh-token validation failed closed");
                false
            }
        }
    }

    /// Idempotent on already-revoked rows; an unknown value is a no-op since
    /// the end state ("not valid") already holds.
    pub async fn revoke(store: &dyn CredentialStore, value: &str) -> AuthResult<()> {
        if let Some(row) = store.refresh_token_by_value(value).await? {
            store.revoke_refresh_token(row.id, Utc::now()).await?;
        }
        Ok(())
    }

    /// Revokes every active token of the user (logout, security events).
    pub async fn revoke_all(store: &dyn CredentialStore, user_id: Uuid) -> AuthResult<u64> {
        let revoked = store.revoke_all_refresh_tokens(user_id, Utc::now()).await?;
        if revoked > 0 {
            tracing::info!(%user_id, revoked, "refresh tokens revoked");
        }
        Ok(revoked)
    }

    /// Exchange an expired access token + live refresh token for a fresh
    /// access token. Every failure collapses to `InvalidToken`.
    pub async fn refresh_access(
        store: &dyn CredentialStore,
        jwt: &JwtSettings,
        expired_access: &str,
        refresh_value: &str,
    ) -> AuthResult<IssuedToken> {
        let claims = TokenService::decode_expired_token(jwt, expired_access)?;
        let user_id: Uuid = claims.sub.parse().map_err(|_| AuthError::InvalidToken {
            reason: "subject claim is not a valid user id".to_string(),
        })?;

        let row = store
            .refresh_token_by_value(refresh_value)
            .await?
            .ok_or_else(|| AuthError::InvalidToken {
                reason: "unknown refresh token".to_string(),
            })?;

        if row.user_id != user_id {
            return Err(AuthError::InvalidToken {
                reason: "refresh token does not belong to the presented subject".to_string(),
            });
        }
        if !row.is_active(Utc::now()) {
            return Err(AuthError::InvalidToken {
                reason: "refresh token expired or revoked".to_string(),
            });
        }

        let user = store
            .user_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AuthError::InvalidToken {
                reason: "subject no longer resolves to an active user".to_string(),
            })?;

        let roles: Vec<String> = store
            .roles_for_user(user.id)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();
        TokenService::issue_access_token(jwt, &user, &roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;
    use crate::store::memory::MemoryStore;

    fn test_jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret".to_string(),
            issuer: "test-issuer".to_string(),
            audience: "test-audience".to_string(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        }
    }

    async fn seed_user(store: &MemoryStore) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Alice Example".to_string(),
            email: Some("alice@x.com".to_string()),
            phone: None,
            department_id: None,
            position_level: None,
            location_code: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        store.insert_user(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn rotation_invalidates_the_previous_value() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;

        let first = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();
        let second = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(!RefreshTokenService::validate(&store, &first).await);
        assert!(RefreshTokenService::validate(&store, &second).await);
        // Rotation updates in place, so the user still has one row.
        assert_eq!(store.token_count(), 1);
    }

    #[tokio::test]
    async fn expired_row_is_revoked_and_replaced() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;

        let stale = RefreshToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: "stale-value".to_string(),
            issued_at: Utc::now() - Duration::days(10),
            expires_at: Utc::now() - Duration::days(3),
            revoked_at: None,
        };
        store.insert_refresh_token(&stale).await.unwrap();

        let fresh = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();

        assert_eq!(store.token_count(), 2);
        let old = store
            .refresh_token_by_value("stale-value")
            .await
            .unwrap()
            .unwrap();
        assert!(old.is_revoked());
        assert!(RefreshTokenService::validate(&store, &fresh).await);
    }

    #[tokio::test]
    async fn validate_fails_closed() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;

        assert!(!RefreshTokenService::validate(&store, "no-such-value").await);

        let value = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();
        RefreshTokenService::revoke(&store, &value).await.unwrap();
        assert!(!RefreshTokenService::validate(&store, &value).await);

        let expired = RefreshToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: "expired-value".to_string(),
            issued_at: Utc::now() - Duration::days(8),
            expires_at: Utc::now() - Duration::hours(1),
            revoked_at: None,
        };
        store.insert_refresh_token(&expired).await.unwrap();
        assert!(!RefreshTokenService::validate(&store, "expired-value").await);
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_tolerates_unknown_values() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;

        let value = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();

        RefreshTokenService::revoke(&store, &value).await.unwrap();
        let first_revocation = store
            .refresh_token_by_value(&value)
            .await
            .unwrap()
            .unwrap()
            .revoked_at;

        RefreshTokenService::revoke(&store, &value).await.unwrap();
        let second_revocation = store
            .refresh_token_by_value(&value)
            .await
            .unwrap()
            .unwrap()
            .revoked_at;
        assert_eq!(first_revocation, second_revocation);

        // Unknown value: success, not an error.
        RefreshTokenService::revoke(&store, "never-issued")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn revoke_all_clears_every_active_token() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;

        let value = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();
        let revoked = RefreshTokenService::revoke_all(&store, user.id)
            .await
            .unwrap();

        assert_eq!(revoked, 1);
        assert!(!RefreshTokenService::validate(&store, &value).await);
    }

    #[tokio::test]
    async fn refresh_access_issues_a_fresh_token_for_the_subject() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;
        store.grant_role(user.id, "asset_manager");

        let access = TokenService::issue_access_token(&jwt, &user, &["asset_manager".to_string()])
            .unwrap()
            .token;
        let refresh_value = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();

        let issued = RefreshTokenService::refresh_access(&store, &jwt, &access, &refresh_value)
            .await
            .unwrap();
        let claims = TokenService::validate_access_token(&jwt, &issued.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.roles, vec!["asset_manager".to_string()]);
    }

    #[tokio::test]
    async fn refresh_access_rejects_a_foreign_refresh_token() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let alice = seed_user(&store).await;

        let bob = User {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
            email: Some("bob@x.com".to_string()),
            ..alice.clone()
        };
        store.insert_user(&bob).await.unwrap();

        let alice_access = TokenService::issue_access_token(&jwt, &alice, &[]).unwrap().token;
        let bob_refresh = RefreshTokenService::issue_or_rotate(&store, &jwt, bob.id)
            .await
            .unwrap();

        match RefreshTokenService::refresh_access(&store, &jwt, &alice_access, &bob_refresh).await {
            Err(AuthError::InvalidToken { .. }) => {}
            other => panic!("expected InvalidToken, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_access_rejects_a_revoked_refresh_token() {
        let store = MemoryStore::new();
        let jwt = test_jwt_settings();
        let user = seed_user(&store).await;

        let access = TokenService::issue_access_token(&jwt, &user, &[]).unwrap().token;
        let refresh_value = RefreshTokenService::issue_or_rotate(&store, &jwt, user.id)
            .await
            .unwrap();
        RefreshTokenService::revoke(&store, &refresh_value)
            .await
            .unwrap();

        match RefreshTokenService::refresh_access(&store, &jwt, &access, &refresh_value).await {
            Err(AuthError::InvalidToken { .. }) => {}
            other => panic!("expected InvalidToken, got {other:?}"),
        }
    }
}
