use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub api_rps: u32,
    pub cors_origins: Vec<String>,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub transition_timeout: Duration,
    pub job_sweep_cron: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_expiry_hours: get_env_parse_or("JWT_EXPIRY_HOURS", 24)?,
            api_rps: get_env_parse_or("API_RPS", 50)?,
            cors_origins: parse_list(&get_env_or("CORS_ORIGINS", "")),
            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|v| !v.trim().is_empty()),
            mail_from: get_env_or("MAIL_FROM", "no-reply@placement.local"),
            db_max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 20)?,
            db_acquire_timeout: Duration::from_secs(get_env_parse_or("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            request_timeout: Duration::from_secs(get_env_parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            transition_timeout: Duration::from_secs(get_env_parse_or("TRANSITION_TIMEOUT_SECS", 10)?),
            job_sweep_cron: get_env_or("JOB_SWEEP_CRON", "0 0 * * * *"),
            log_format: parse_log_format(&get_env_or("LOG_FORMAT", "text"))?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "text" | "" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(Error::Config(format!("Invalid value for LOG_FORMAT: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origins_are_trimmed_and_empty_entries_dropped() {
        let origins = parse_list(" https://a.example , ,https://b.example");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn log_format_accepts_known_values_only() {
        assert_eq!(parse_log_format("JSON").unwrap(), LogFormat::Json);
        assert_eq!(parse_log_format("text").unwrap(), LogFormat::Text);
        assert!(matches!(parse_log_format("xml"), Err(Error::Config(_))));
    }
}
