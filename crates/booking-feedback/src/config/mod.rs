use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

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
    pub feedback: FeedbackConfig,
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

        let completion_buffer_hours = env::var("FEEDBACK_COMPLETION_BUFFER_HOURS")
            .unwrap_or_else(|_| FeedbackConfig::DEFAULT_COMPLETION_BUFFER_HOURS.to_string())
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidCompletionBuffer)?;

        let admin_role = env::var("FEEDBACK_ADMIN_ROLE")
            .unwrap_or_else(|_| FeedbackConfig::DEFAULT_ADMIN_ROLE.to_string());
        let admin_role = admin_role.trim().to_string();
        if admin_role.is_empty() {
            return Err(ConfigError::EmptyAdminRole);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            feedback: FeedbackConfig {
                completion_buffer_hours,
                admin_role,
            },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Business rules for the feedback service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackConfig {
    /// Hours after a booking's start before it counts as complete. Some bookings carry no end
    /// time, so start plus a buffer stands in for completion.
    pub completion_buffer_hours: u32,
    /// Role granted read/write access on stored feedback.
    pub admin_role: String,
}

impl FeedbackConfig {
    pub const DEFAULT_COMPLETION_BUFFER_HOURS: u32 = 2;
    pub const DEFAULT_ADMIN_ROLE: &'static str = "admin";

    pub fn completion_buffer(&self) -> Duration {
        Duration::hours(i64::from(self.completion_buffer_hours))
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            completion_buffer_hours: Self::DEFAULT_COMPLETION_BUFFER_HOURS,
            admin_role: Self::DEFAULT_ADMIN_ROLE.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCompletionBuffer,
    EmptyAdminRole,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCompletionBuffer => write!(
                f,
                "FEEDBACK_COMPLETION_BUFFER_HOURS must be a non-negative whole number of hours"
            ),
            ConfigError::EmptyAdminRole => write!(f, "FEEDBACK_ADMIN_ROLE must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCompletionBuffer
            | ConfigError::EmptyAdminRole => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("FEEDBACK_COMPLETION_BUFFER_HOURS");
        env::remove_var("FEEDBACK_ADMIN_ROLE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.feedback, FeedbackConfig::default());
        assert_eq!(config.feedback.completion_buffer(), Duration::hours(2));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_feedback_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("FEEDBACK_COMPLETION_BUFFER_HOURS", "6");
        env::set_var("FEEDBACK_ADMIN_ROLE", " support ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.feedback.completion_buffer_hours, 6);
        assert_eq!(config.feedback.admin_role, "support");
        reset_env();
    }

    #[test]
    fn rejects_negative_completion_buffer() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FEEDBACK_COMPLETION_BUFFER_HOURS", "-1");
        let err = AppConfig::load().expect_err("negative buffer rejected");
        assert!(matches!(err, ConfigError::InvalidCompletionBuffer));
        reset_env();
    }

    #[test]
    fn rejects_blank_admin_role() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FEEDBACK_ADMIN_ROLE", "   ");
        let err = AppConfig::load().expect_err("blank role rejected");
        assert!(matches!(err, ConfigError::EmptyAdminRole));
        reset_env();
    }
}
