use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtSettings,
    /// Exact origins allowed by CORS. Empty list = permissive (local development).
    pub cors_allowed_origins: Vec<String>,
}

/// Token-signing parameters, fixed per deployment.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            jwt: JwtSettings {
                secret: required("JWT_SECRET")?,
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "assetdesk-auth".into()),
                audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "assetdesk".into()),
                access_ttl_minutes: env::var("JWT_ACCESS_TTL_MINUTES")
                    .unwrap_or_else(|_| "60".into())
                    .parse()?,
                refresh_ttl_days: env::var("REFRESH_TTL_DAYS")
                    .unwrap_or_else(|_| "7".into())
                    .parse()?,
            },
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
