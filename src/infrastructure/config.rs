use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "dev-only-insecure-jwt-secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub cors_allowed_origin: Option<String>,
    pub log_level: String,
}

impl AppConfig {
    /// Reads configuration from the environment, loading a `.env` file first
    /// when one is present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => DEV_JWT_SECRET.to_string(),
            _ => bail!("JWT_SECRET must be set"),
        };

        Ok(Self {
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:8080"),
            database_url: var_or("DATABASE_URL", "sqlite://bank.db"),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_ttl_secs: parse_var("JWT_TTL_SECS", 3600)?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|origin| !origin.is_empty()),
            log_level: var_or("LOG_LEVEL", "info"),
        })
    }

    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: u32 = parse_var("BANK_LEDGER_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_var_or_default() {
        assert_eq!(var_or("BANK_LEDGER_TEST_UNSET_VARIABLE", "x"), "x");
    }
}
