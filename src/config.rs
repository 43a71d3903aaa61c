//! Server configuration from environment variables.

use crate::auth::jwt::DEFAULT_TTL_MINUTES;
use crate::middleware::RateLimitConfig;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub login_rate_limit: RateLimitConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./bizportal.db".to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

        // Sessions stay short-lived: minutes up to a few hours.
        let token_ttl_minutes = std::env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| (1..=240).contains(&v))
            .unwrap_or(DEFAULT_TTL_MINUTES);

        let login_max_requests = std::env::var("LOGIN_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(20);

        let login_window_secs = std::env::var("LOGIN_RATE_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(60);

        let login_burst = std::env::var("LOGIN_RATE_BURST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Ok(Self {
            port,
            database_path,
            jwt_secret,
            token_ttl_minutes,
            login_rate_limit: RateLimitConfig {
                max_requests: login_max_requests,
                window: Duration::from_secs(login_window_secs),
                burst: login_burst,
            },
        })
    }
}
