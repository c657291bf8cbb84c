use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    /// Process-wide environment used when rendering errors. Defaults to
    /// production until [`Environment::install`] runs.
    pub fn current() -> Self {
        ENVIRONMENT.get().copied().unwrap_or(Environment::Production)
    }

    pub fn install(self) {
        if ENVIRONMENT.set(self).is_err() {
            tracing::warn!(env = ?self, "environment already installed; ignoring");
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub verify_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// STARTTLS; disable only for local catch-all servers.
    pub tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from: String,
    /// `None` means mail is logged instead of sent.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub public_base_url: String,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "storefront-auth"),
            audience: env_or("JWT_AUDIENCE", "storefront-users"),
            access_ttl_minutes: env_parsed("JWT_ACCESS_TTL_MINUTES", 60),
            verify_ttl_minutes: env_parsed("EMAIL_VERIFY_TTL_MINUTES", 60),
        };

        let smtp = std::env::var("SMTP_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map(|host| SmtpConfig {
                host,
                port: env_parsed("SMTP_PORT", 587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                tls: env_parsed("SMTP_TLS", true),
            });
        let mail = MailConfig {
            from: env_or("MAIL_FROM", "Storefront <no-reply@storefront.local>"),
            smtp,
        };

        Ok(Self {
            database_url,
            db_max_connections: env_parsed("DB_MAX_CONNECTIONS", 10),
            public_base_url: normalize_base_url(&env_or("PUBLIC_BASE_URL", "http://localhost:3000")),
            environment: Environment::parse(&env_or("APP_ENV", "production")),
            jwt,
            mail,
        })
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slashes() {
        assert_eq!(normalize_base_url("https://shop.example.com//"), "https://shop.example.com");
        assert_eq!(normalize_base_url(" http://localhost:3000 "), "http://localhost:3000");
    }

    #[test]
    fn environment_defaults_to_production() {
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("DEV"), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Production);
        assert_eq!(Environment::parse(""), Environment::Production);
    }
}
