use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub otp_expire_minutes: i64,
    pub otp_length: usize,
    pub cors_origins: Vec<String>,
    pub low_stock_threshold: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT").unwrap_or(8000);
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            access_token_expire_minutes: parse_var("ACCESS_TOKEN_EXPIRE_MINUTES").unwrap_or(30),
            refresh_token_expire_days: parse_var("REFRESH_TOKEN_EXPIRE_DAYS").unwrap_or(7),
            otp_expire_minutes: parse_var("OTP_EXPIRE_MINUTES").unwrap_or(10),
            otp_length: parse_var("OTP_LENGTH").unwrap_or(6),
            cors_origins,
            low_stock_threshold: parse_var("LOW_STOCK_THRESHOLD").unwrap_or(10),
        })
    }

    /// Defaults for everything except the connection string and signing secret.
    pub fn with_defaults(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            jwt_secret: jwt_secret.into(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            otp_expire_minutes: 10,
            otp_length: 6,
            cors_origins: vec!["http://localhost:3000".to_string()],
            low_stock_threshold: 10,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = split_origins(" http://a.test ,,http://b.test ");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::with_defaults("postgres://localhost/db", "secret");
        assert_eq!(config.port, 8000);
        assert_eq!(config.otp_length, 6);
        assert_eq!(config.access_token_expire_minutes, 30);
        assert_eq!(config.refresh_token_expire_days, 7);
    }
}
