//! Client configuration: OAuth application credentials and host selection.

use std::env;
use std::fmt;
use std::time::Duration;

pub const PRODUCTION_BASE_URL: &str = "https://api.wahooligan.com";
pub const SANDBOX_BASE_URL: &str = "https://developers.staging.wahooligan.com";

/// OAuth application settings and environment selection.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// `true` targets the production API, `false` the staging sandbox.
    pub use_production: bool,
    /// Per-request deadline applied by the transport. `None` keeps the
    /// transport's default.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("use_production", &self.use_production)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        use_production: bool,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            use_production,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &'static str {
        if self.use_production {
            PRODUCTION_BASE_URL
        } else {
            SANDBOX_BASE_URL
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// `WAHOO_CLIENT_ID` and `WAHOO_CLIENT_SECRET` are required;
    /// `WAHOO_REDIRECT_URI`, `WAHOO_USE_PRODUCTION` and `WAHOO_TIMEOUT_SECS`
    /// are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let use_production = match env::var("WAHOO_USE_PRODUCTION") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                var: "WAHOO_USE_PRODUCTION",
                value,
            })?,
            Err(_) => false,
        };

        let timeout = match env::var("WAHOO_TIMEOUT_SECS") {
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: "WAHOO_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            Err(_) => None,
        };

        Ok(Self {
            client_id: env::var("WAHOO_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WAHOO_CLIENT_ID"))?,
            client_secret: env::var("WAHOO_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WAHOO_CLIENT_SECRET"))?,
            redirect_uri: env::var("WAHOO_REDIRECT_URI").unwrap_or_default(),
            use_production,
            timeout,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
