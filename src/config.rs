//! Runtime settings, read from the environment.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Which acquisition capability the runtime offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Device camera, fed through a drop folder.
    Native,
    /// Arbitrary file chosen by the user.
    Web,
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" | "camera" => Ok(Platform::Native),
            "web" | "file" => Ok(Platform::Web),
            other => Err(anyhow!("Unknown platform {:?} (expected native or web)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub demo_mode: bool,
    pub platform: Platform,
    pub inbox_folder: Option<PathBuf>,
    pub request_timeout: Duration,
    pub capture_timeout: Duration,
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: DEFAULT_API_URL.to_string(),
            demo_mode: false,
            platform: Platform::Web,
            inbox_folder: None,
            request_timeout: Duration::from_secs(30),
            capture_timeout: Duration::from_secs(120),
            debounce_ms: 700,
        }
    }
}

impl Settings {
    /// Build settings from `SCANNER_*` environment variables.
    ///
    /// - `SCANNER_API_URL` - gateway base URL (default: http://localhost:3000)
    /// - `SCANNER_DEMO` - use the in-memory demo gateway (default: false)
    /// - `SCANNER_PLATFORM` - `native` or `web` (default: web)
    /// - `SCANNER_INBOX` - camera drop folder, required for `native`
    /// - `SCANNER_TIMEOUT_SECS` - HTTP request timeout (default: 30)
    /// - `SCANNER_CAPTURE_TIMEOUT_SECS` - camera capture wait (default: 120)
    /// - `SCANNER_DEBOUNCE_MS` - file size settle interval (default: 700)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base_url = get("SCANNER_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        let demo_mode = match get("SCANNER_DEMO") {
            Some(value) => parse_bool(&value).context("SCANNER_DEMO")?,
            None => defaults.demo_mode,
        };
        let platform = match get("SCANNER_PLATFORM") {
            Some(value) => value.parse().context("SCANNER_PLATFORM")?,
            None => defaults.platform,
        };
        let inbox_folder = get("SCANNER_INBOX").map(PathBuf::from);
        if platform == Platform::Native && inbox_folder.is_none() {
            return Err(anyhow!("SCANNER_INBOX is required when SCANNER_PLATFORM=native"));
        }

        let request_timeout = match get("SCANNER_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_number(&value).context("SCANNER_TIMEOUT_SECS")?),
            None => defaults.request_timeout,
        };
        let capture_timeout = match get("SCANNER_CAPTURE_TIMEOUT_SECS") {
            Some(value) => {
                Duration::from_secs(parse_number(&value).context("SCANNER_CAPTURE_TIMEOUT_SECS")?)
            }
            None => defaults.capture_timeout,
        };
        let debounce_ms = match get("SCANNER_DEBOUNCE_MS") {
            Some(value) => parse_number(&value).context("SCANNER_DEBOUNCE_MS")?,
            None => defaults.debounce_ms,
        };

        Ok(Settings {
            api_base_url,
            demo_mode,
            platform,
            inbox_folder,
            request_timeout,
            capture_timeout,
            debounce_ms,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid boolean {:?}", other)),
    }
}

fn parse_number(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| anyhow!("Invalid number {:?}: {}", value, e))
}
