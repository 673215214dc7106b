//! Process-wide configuration, read once at startup

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::llm::GenerationConfig;
use crate::relay::RelaySettings;

pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_MODEL: &str = "nvidia/llama-3.1-nemotron-70b-instruct";
pub const DEFAULT_PORT: u16 = 5202;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the relay needs, immutable after startup
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub server: ServerConfig,
    pub relay: RelaySettings,
}

/// Remote model provider settings
#[derive(Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Total time allowed for a non-streaming completion
    pub request_timeout: Duration,
    pub generation: GenerationConfig,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Inbound listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Config {
    /// Load from the process environment (call `dotenvy::dotenv()` first to
    /// pick up a `.env` file)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("LLM_API_KEY")
            .or_else(|| get("NVIDIA_API_KEY"))
            .ok_or(ConfigError::Missing("LLM_API_KEY"))?;

        let base_url = get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !is_http_url(&base_url) {
            return Err(ConfigError::Invalid {
                name: "LLM_BASE_URL",
                value: base_url,
            });
        }

        let upstream = UpstreamConfig {
            base_url,
            api_key,
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: Duration::from_secs(parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                get("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
            generation: GenerationConfig::default(),
        };

        let allowed_origins = parse_origins(
            &get("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        )?;

        let server = ServerConfig {
            host: parse_or("HOST", get("HOST"), IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            allowed_origins,
        };

        let relay = RelaySettings {
            idle_timeout: Duration::from_secs(parse_or(
                "STREAM_IDLE_TIMEOUT_SECS",
                get("STREAM_IDLE_TIMEOUT_SECS"),
                DEFAULT_STREAM_IDLE_TIMEOUT_SECS,
            )?),
            ..RelaySettings::default()
        };

        Ok(Self {
            upstream,
            server,
            relay,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Origins must be bare `scheme://host[:port]` values
fn parse_origins(value: &str) -> Result<Vec<String>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            let rest = origin
                .strip_prefix("http://")
                .or_else(|| origin.strip_prefix("https://"));
            match rest {
                Some(host) if !host.is_empty() && !host.contains(['/', ' ']) => Ok(origin.to_string()),
                _ => Err(ConfigError::Invalid {
                    name: "ALLOWED_ORIGINS",
                    value: origin.to_string(),
                }),
            }
        })
        .collect()
}
