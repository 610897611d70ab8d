/*
 * Responsibility
 * - 環境変数や設定の読み込み (JWT_SECRET, JWT_EXPIRATION_MS, DATABASE_URL など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - secret の値そのものはエラーメッセージやログに出さない
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::{TimeDelta, Utc};

pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer";
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_HTTP_BODY_LIMIT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Token settings (`jwt.*` in the old properties file).
#[derive(Clone)]
pub struct JwtSettings {
    /// Base64 encoded HMAC key. Decoded once by `SigningSecret::from_base64`.
    pub secret: String,
    pub expiration_ms: u64,
    pub token_prefix: String,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("expiration_ms", &self.expiration_ms)
            .field("token_prefix", &self.token_prefix)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // None => in-memory user store (development only)
    pub database_url: Option<String>,

    pub jwt: JwtSettings,
    pub bcrypt_cost: u32,

    pub http_body_limit_bytes: usize,
    pub http_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process environment in `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let database_url = lookup("DATABASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let secret = lookup("JWT_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let expiration_ms = lookup("JWT_EXPIRATION_MS")
            .ok_or(ConfigError::Missing("JWT_EXPIRATION_MS"))?
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid("JWT_EXPIRATION_MS"))?;

        // 発行時に exp が表現できない TTL は起動時に弾く
        let issuable = i64::try_from(expiration_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_some();
        if !issuable {
            return Err(ConfigError::Invalid("JWT_EXPIRATION_MS"));
        }

        let token_prefix = lookup("JWT_TOKEN_PREFIX")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_PREFIX.to_string());

        if token_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("JWT_TOKEN_PREFIX"));
        }

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(s) => s
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|c| BCRYPT_COST_RANGE.contains(c))
                .ok_or(ConfigError::Invalid("BCRYPT_COST"))?,
            None => DEFAULT_BCRYPT_COST,
        };

        let http_body_limit_bytes = match lookup("HTTP_BODY_LIMIT_BYTES") {
            Some(s) => positive(&s).ok_or(ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES"))?,
            None => DEFAULT_HTTP_BODY_LIMIT_BYTES,
        };

        let http_timeout_seconds = match lookup("HTTP_TIMEOUT_SECONDS") {
            Some(s) => positive(&s).ok_or(ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECONDS,
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            jwt: JwtSettings {
                secret,
                expiration_ms,
                token_prefix,
            },
            bcrypt_cost,
            http_body_limit_bytes,
            http_timeout_seconds,
        })
    }
}

// 0 は「全リクエストが即 timeout / 全 body が拒否」になるので不可
fn positive<T>(raw: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    raw.trim().parse::<T>().ok().filter(|v| *v > T::default())
}
