//! Access-token issuance and validation, plus opaque refresh-token values.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;

use crate::config::JwtSettings;
use crate::errors::{AuthError, AuthResult};
use crate::models::auth::Claims;
use crate::models::user::User;

/// A signed access token together with its expiry instant.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService;

impl TokenService {
    /// Builds and signs the bearer token: identity + role claims, HS256,
    /// bounded by the configured access TTL.
    pub fn issue_access_token(
        jwt: &JwtSettings,
        user: &User,
        roles: &[String],
    ) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(jwt.access_ttl_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            unique_name: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
            roles: roles.to_vec(),
            iss: jwt.issuer.clone(),
            aud: jwt.audience.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(jwt.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("failed to sign access token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// 64 bytes of CSPRNG output, base64-encoded. Carries no claims; meaning
    /// exists only through the store row.
    pub fn generate_refresh_value() -> String {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    /// Strict validation path used for authorization: signature, issuer,
    /// audience, algorithm and expiry must all hold.
    pub fn validate_access_token(jwt: &JwtSettings, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &decoding_key(jwt), &validation(jwt, true))
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken {
                reason: e.to_string(),
            })
    }

    /// Expired-tolerant decode for the refresh flow. Everything except the
    /// lifetime is still enforced.
    pub fn decode_expired_token(jwt: &JwtSettings, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &decoding_key(jwt), &validation(jwt, false))
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken {
                reason: e.to_string(),
            })
    }
}

fn decoding_key(jwt: &JwtSettings) -> DecodingKey {
    DecodingKey::from_secret(jwt.secret.as_bytes())
}

fn validation(jwt: &JwtSettings, validate_exp: bool) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(std::slice::from_ref(&jwt.issuer));
    validation.set_audience(std::slice::from_ref(&jwt.audience));
    validation.validate_exp = validate_exp;
    validation
}
