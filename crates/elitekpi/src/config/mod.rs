use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::efficiency::{ScoringConfig, ScoringConfigError};
use crate::records::UserId;

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
    pub scoring: ScoringSettings,
    pub session: SessionConfig,
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
        let format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let lookback_days = env::var("KPI_LOOKBACK_DAYS")
            .unwrap_or_else(|_| ScoringSettings::DEFAULT_LOOKBACK_DAYS.to_string())
            .parse::<u32>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or(ConfigError::InvalidLookback)?;

        let scoring_path = env::var("KPI_SCORING_CONFIG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let rules = match &scoring_path {
            Some(path) => ScoringConfig::from_path(path).map_err(|source| ConfigError::Scoring {
                path: path.clone(),
                source,
            })?,
            None => ScoringConfig::default(),
        };

        let dev_user = env::var("APP_DEV_USER")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(UserId);
        if dev_user.is_some() && environment == AppEnvironment::Production {
            return Err(ConfigError::DevUserInProduction);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            scoring: ScoringSettings {
                lookback_days,
                rules,
            },
            session: SessionConfig { dev_user },
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Efficiency scoring inputs: the activity lookback and the tuned rules.
#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub lookback_days: u32,
    pub rules: ScoringConfig,
}

impl ScoringSettings {
    pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
}

/// Session fallbacks for local development.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub dev_user: Option<UserId>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidLookback,
    Scoring {
        path: PathBuf,
        source: ScoringConfigError,
    },
    DevUserInProduction,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLookback => {
                write!(f, "KPI_LOOKBACK_DAYS must be a positive whole number")
            }
            ConfigError::Scoring { path, source } => {
                write!(f, "KPI_SCORING_CONFIG ({}): {}", path.display(), source)
            }
            ConfigError::DevUserInProduction => {
                write!(f, "APP_DEV_USER cannot be set when APP_ENV is production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Scoring { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLookback
            | ConfigError::DevUserInProduction => None,
        }
    }
}
