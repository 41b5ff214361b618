//! Client configuration: backend base URL plus a few transport knobs.
//!
//! Values come from CLI flags (which also cover `INTERVIEW_CHAT_API_URL`
//! through clap's env support) layered over an optional TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "INTERVIEW_CHAT_API_URL";

/// Where exported logs are written when nothing else is configured.
pub const DEFAULT_LOG_OUTPUT: &str = "student_logs.json";

/// On-disk config file shape. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub log_output: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved settings for talking to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Absolute http(s) URL without a trailing slash.
    pub base_url: String,
    pub connect_timeout: Option<Duration>,
    /// No request timeout unless configured; a hung backend keeps the send
    /// pending until the transport gives up.
    pub request_timeout: Option<Duration>,
    pub log_output: PathBuf,
}

impl ClientConfig {
    /// Config with only a base URL; everything else at defaults.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            connect_timeout: None,
            request_timeout: None,
            log_output: PathBuf::from(DEFAULT_LOG_OUTPUT),
        })
    }

    /// Merge an explicit URL (flag or env) over an optional config file.
    pub fn resolve(api_url: Option<&str>, file: Option<ConfigFile>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let url = api_url
            .filter(|u| !u.trim().is_empty())
            .or(file.api_url.as_deref())
            .ok_or(ConfigError::MissingApiUrl)?;

        let mut config = Self::new(url)?;
        config.connect_timeout = file.connect_timeout_secs.map(Duration::from_secs);
        config.request_timeout = file.request_timeout_secs.map(Duration::from_secs);
        if let Some(path) = file.log_output {
            config.log_output = path;
        }
        Ok(config)
    }

    /// Full URL for an endpoint path such as `/chat`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Validate a base URL and strip trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingApiUrl);
    }
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidApiUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConfigError::InvalidApiUrl {
            url: trimmed.to_string(),
            reason: "base URL must not carry a query or fragment".to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
