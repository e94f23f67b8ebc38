use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

pub const TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const PORT_VAR: &str = "PORT";
pub const BASE_URL_VAR: &str = "RENDER_EXTERNAL_URL";
pub const USERNAME_VAR: &str = "TARGET_USERNAME";

pub const DEFAULT_PORT: u16 = 8443;
pub const DEFAULT_TARGET_USERNAME: &str = "@indiandalla1bot";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("PORT must be an integer between 1 and 65535, got {value:?}")]
    InvalidPort { value: String },

    #[error("webhook URL {url:?} is not a valid absolute URL")]
    InvalidUrl {
        url: String,
        #[source]
        source: Option<url::ParseError>,
    },
}

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub port: u16,
    pub base_url: String,
    /// `<base_url>/<token>`, exactly as advertised to Telegram.
    pub webhook_url: Url,
    pub target_username: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("target_username", &self.target_username)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Blank values count
    /// as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = var(TOKEN_VAR).ok_or(ConfigError::Missing(TOKEN_VAR))?;
        let base_url = var(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;

        let port = match var(PORT_VAR) {
            None => DEFAULT_PORT,
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort { value: raw }),
            },
        };

        let target_username =
            var(USERNAME_VAR).unwrap_or_else(|| DEFAULT_TARGET_USERNAME.to_string());

        // No slash normalization: a trailing slash on the base URL is kept.
        let raw_url = format!("{}/{}", base_url, token);
        let webhook_url = parse_absolute(&raw_url)?;

        Ok(Self {
            token,
            port,
            base_url,
            webhook_url,
            target_username,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Secret path the webhook is served on.
    pub fn webhook_path(&self) -> String {
        format!("/{}", self.token)
    }
}

fn parse_absolute(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source: Some(e),
    })?;
    // Parses, but Telegram cannot reach it (e.g. `mailto:`).
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            source: None,
        });
    }
    Ok(url)
}
