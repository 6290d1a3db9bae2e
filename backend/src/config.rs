use anyhow::anyhow;
use std::{env, net::SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub redis_url: Option<String>,
    pub redis_pool_size: u32,
    pub redis_connect_timeout: u64,
    pub smtp: SmtpConfig,
    /// Wrong OTP guesses allowed per issued code. Zero disables the limit.
    pub otp_max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub skip_send: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/grocery".to_string());

        let bind_addr_raw = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr: SocketAddr = bind_addr_raw
            .parse()
            .map_err(|_| anyhow!("Invalid BIND_ADDR value: {}", bind_addr_raw))?;

        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| "GroceryStoreManagementSystem".to_string());

        let jwt_expiration_hours =
            validate_expiration_hours(parse_env("JWT_EXPIRATION_HOURS", 24))?;

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let redis_pool_size = parse_env("REDIS_POOL_SIZE", 8);
        let redis_connect_timeout = parse_env("REDIS_CONNECT_TIMEOUT", 5);

        let smtp = SmtpConfig {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_env("SMTP_PORT", 587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_address: env::var("SMTP_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@grocery.local".to_string()),
            skip_send: env::var("SMTP_SKIP_SEND")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };

        let otp_max_attempts = parse_env("OTP_MAX_ATTEMPTS", 5);

        Ok(Config {
            database_url,
            bind_addr,
            jwt_secret,
            jwt_expiration_hours,
            redis_url,
            redis_pool_size,
            redis_connect_timeout,
            smtp,
            otp_max_attempts,
        })
    }
}

/// One year.
pub const MAX_JWT_EXPIRATION_HOURS: u64 = 24 * 365;

fn validate_expiration_hours(hours: u64) -> anyhow::Result<u64> {
    if hours == 0 || hours > MAX_JWT_EXPIRATION_HOURS {
        return Err(anyhow!(
            "JWT_EXPIRATION_HOURS must be between 1 and {}, got {}",
            MAX_JWT_EXPIRATION_HOURS,
            hours
        ));
    }
    Ok(hours)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}
