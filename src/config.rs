use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

use crate::constants::{DEFAULT_HOST, DEFAULT_KEEP_ALIVE, DEFAULT_PORT, DEFAULT_UPSTREAM_URL};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("{var} is not a valid number: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the translating upstream; its path is replaced by the upstream chat route
    pub upstream_url: Url,
    /// Base URL for unmatched paths. `None` targets the host the request names.
    pub passthrough_url: Option<Url>,
    /// Keep-alive comment interval for re-framed streams (`None` disables)
    pub keep_alive: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let host = env::var("SENSECHAT_PROXY_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("SENSECHAT_PROXY_PORT") {
            Ok(p) => p.parse().map_err(|_| ConfigError::InvalidNumber {
                var: "SENSECHAT_PROXY_PORT",
                value: p,
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let upstream_url = parse_url(
            "SENSECHAT_PROXY_UPSTREAM_URL",
            &env::var("SENSECHAT_PROXY_UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
        )?;

        let passthrough_url = match env::var("SENSECHAT_PROXY_PASSTHROUGH_URL") {
            Ok(u) if !u.trim().is_empty() => {
                Some(parse_url("SENSECHAT_PROXY_PASSTHROUGH_URL", u.trim())?)
            }
            _ => None,
        };

        let keep_alive = match env::var("SENSECHAT_PROXY_KEEP_ALIVE_SECS") {
            Ok(s) => parse_keep_alive(&s).ok_or(ConfigError::InvalidNumber {
                var: "SENSECHAT_PROXY_KEEP_ALIVE_SECS",
                value: s,
            })?,
            Err(_) => Some(DEFAULT_KEEP_ALIVE),
        };

        Ok(Self {
            host,
            port,
            upstream_url,
            passthrough_url,
            keep_alive,
        })
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { var, source })
}

/// `0` disables keep-alives; anything unparseable is `None` at the outer level.
fn parse_keep_alive(value: &str) -> Option<Option<Duration>> {
    let secs: u64 = value.trim().parse().ok()?;
    Some((secs > 0).then(|| Duration::from_secs(secs)))
}
