use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

const DEVELOPMENT_JWT_SECRET: &str = "interview-hub-development-secret";

pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_REFRESH_TOKEN_HOURS: i64 = 365 * 24;
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_ARCHIVE_RETENTION_DAYS: i64 = 100 * 365;
pub const MAX_ARCHIVE_INTERVAL_HOURS: u64 = 365 * 24;
/// Upper bound for every second-based job setting.
pub const MAX_JOB_SECONDS: u64 = 24 * 60 * 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub jobs: JobsConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match non_empty("APP_JWT_SECRET") {
            Some(secret) => secret,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSecret { key: "APP_JWT_SECRET" })
            }
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                jwt_secret,
                access_token_minutes: env_bounded(
                    "APP_ACCESS_TOKEN_MINUTES",
                    60,
                    1..=MAX_ACCESS_TOKEN_MINUTES,
                )?,
                refresh_token_hours: env_bounded(
                    "APP_REFRESH_TOKEN_HOURS",
                    24,
                    1..=MAX_REFRESH_TOKEN_HOURS,
                )?,
            },
            mail: MailConfig {
                from: env::var("APP_MAIL_FROM")
                    .unwrap_or_else(|_| "admin@interviewhub.local".to_string()),
                smtp_host: non_empty("APP_SMTP_HOST"),
                smtp_user: non_empty("APP_SMTP_USER"),
                smtp_password: non_empty("APP_SMTP_PASSWORD"),
            },
            jobs: JobsConfig {
                reminder_lead_minutes: env_bounded(
                    "APP_REMINDER_LEAD_MINUTES",
                    60,
                    1..=MAX_REMINDER_LEAD_MINUTES,
                )?,
                reminder_window_seconds: env_bounded(
                    "APP_REMINDER_WINDOW_SECONDS",
                    60,
                    1..=MAX_JOB_SECONDS as i64,
                )?,
                reminder_interval_seconds: env_bounded(
                    "APP_REMINDER_INTERVAL_SECONDS",
                    60,
                    1..=MAX_JOB_SECONDS,
                )?,
                archive_retention_days: env_bounded(
                    "APP_ARCHIVE_RETENTION_DAYS",
                    180,
                    1..=MAX_ARCHIVE_RETENTION_DAYS,
                )?,
                archive_interval_hours: env_bounded(
                    "APP_ARCHIVE_INTERVAL_HOURS",
                    168,
                    1..=MAX_ARCHIVE_INTERVAL_HOURS,
                )?,
                activity_flush_seconds: env_bounded(
                    "APP_ACTIVITY_FLUSH_SECONDS",
                    30,
                    1..=MAX_JOB_SECONDS,
                )?,
            },
            storage: StorageConfig {
                data_file: non_empty("APP_DATA_FILE").map(PathBuf::from),
            },
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_bounded<T>(key: &'static str, default: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd,
{
    match non_empty(key) {
        Some(raw) => raw
            .parse()
            .ok()
            .filter(|value| range.contains(value))
            .ok_or(ConfigError::InvalidNumber { key }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Token signing secret and lifetimes.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_hours: i64,
}

impl AuthConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::hours(self.refresh_token_hours)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_hours", &self.refresh_token_hours)
            .finish()
    }
}

/// Outgoing mail. Without an SMTP host, messages are only logged.
#[derive(Clone)]
pub struct MailConfig {
    pub from: String,
    pub smtp_host: Option<String>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("from", &self.from)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Schedules of the background jobs.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub reminder_lead_minutes: i64,
    pub reminder_window_seconds: i64,
    pub reminder_interval_seconds: u64,
    pub archive_retention_days: i64,
    pub archive_interval_hours: u64,
    pub activity_flush_seconds: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            reminder_lead_minutes: 60,
            reminder_window_seconds: 60,
            reminder_interval_seconds: 60,
            archive_retention_days: 180,
            archive_interval_hours: 168,
            activity_flush_seconds: 30,
        }
    }
}

/// Where the store snapshot lives; `None` keeps data in memory only.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub data_file: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    MissingSecret { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number within its allowed range")
            }
            ConfigError::MissingSecret { key } => {
                write!(f, "{key} must be set when APP_ENV is production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingSecret { .. } => None,
        }
    }
}
