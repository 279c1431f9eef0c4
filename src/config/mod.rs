use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::membership::{
    ChannelId, MembershipSettings, PageLimits, ReactionPolicy, RoleId, DEFAULT_SUBMISSION_QUOTA,
};

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
    /// Static secret every API request must present; the original deployment
    /// style, not a substitute for real caller authentication.
    pub shared_secret: String,
    pub ledger_path: PathBuf,
    pub membership: MembershipSettings,
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

        let shared_secret =
            env::var("API_SHARED_SECRET").unwrap_or_else(|_| "gatehouse-dev-secret".to_string());
        let ledger_path = PathBuf::from(
            env::var("SUBMISSION_LEDGER_PATH")
                .unwrap_or_else(|_| "data/submissions.json".to_string()),
        );

        let submission_quota = env::var("SUBMISSION_QUOTA")
            .unwrap_or_else(|_| DEFAULT_SUBMISSION_QUOTA.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidCount {
                name: "SUBMISSION_QUOTA",
            })?;
        let page_capacity = env::var("REVIEW_PAGE_CAPACITY")
            .unwrap_or_else(|_| "25".to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidCount {
                name: "REVIEW_PAGE_CAPACITY",
            })?;
        let value_limit = env::var("REVIEW_VALUE_LIMIT")
            .unwrap_or_else(|_| "1024".to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidCount {
                name: "REVIEW_VALUE_LIMIT",
            })?;

        let defaults = ReactionPolicy::default();
        let reactions = ReactionPolicy {
            accept: env::var("ACCEPT_EMOJI").unwrap_or(defaults.accept),
            reject: env::var("REJECT_EMOJI").unwrap_or(defaults.reject),
        };

        let membership = MembershipSettings {
            whitelist_role: RoleId(
                env::var("WHITELIST_ROLE_ID").unwrap_or_else(|_| "role-whitelisted".to_string()),
            ),
            rejected_role: RoleId(
                env::var("REJECTED_ROLE_ID").unwrap_or_else(|_| "role-rejected".to_string()),
            ),
            review_channel: ChannelId(
                env::var("REVIEW_CHANNEL_ID").unwrap_or_else(|_| "membership-review".to_string()),
            ),
            submission_quota,
            page_limits: PageLimits::new(page_capacity, value_limit),
            reactions,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            shared_secret,
            ledger_path,
            membership,
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCount { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCount { name } => {
                write!(f, "{name} must be a whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidCount { .. } => None,
        }
    }
}
