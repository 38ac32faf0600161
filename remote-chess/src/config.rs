//! Runtime configuration.
//!
//! Values come from a JSON object on disk (`configs/config.json` unless a
//! path is given) and are then overridden by environment variables of the
//! same name. Every option has a compile-time default, so a missing default
//! file simply means "play against the local engine".

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ai_client::{RemoteAiConfig, RetryPolicy};

/// Default location of the JSON config file.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.json";

/// Default advisory search budget sent with each AI request.
const DEFAULT_THINK_MS: u64 = 2000;

/// Default hard bound on one AI request attempt (in seconds).
const DEFAULT_TIMEOUT_SECS: f64 = 15.0;

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Default directory for rolling log files.
const DEFAULT_LOG_DIR: &str = "logs";

/// What the session does when an AI request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Show the failure and wait for a manual retry.
    #[default]
    Report,
    /// Play the local engine's move for this turn.
    Local,
    /// The AI side resigns.
    Forfeit,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "local" => Ok(Self::Local),
            "forfeit" => Ok(Self::Forfeit),
            other => Err(format!(
                "unknown fallback '{}' (expected report, local or forfeit)",
                other
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("config file {0} must hold a JSON object")]
    NotAnObject(PathBuf),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the AI service. `None` means the local engine plays.
    pub ai_url: Option<String>,
    pub api_key: String,
    pub think: Duration,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub fallback: FallbackPolicy,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_url: None,
            api_key: String::new(),
            think: Duration::from_millis(DEFAULT_THINK_MS),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            fallback: FallbackPolicy::Report,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl AppConfig {
    /// Load from `path` (or the default path) and the process environment.
    ///
    /// An explicitly given file must exist; the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(read_file(path)?),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Some(read_file(default)?)
                } else {
                    tracing::debug!(path = %default.display(), "no config file, using defaults");
                    None
                }
            }
        };
        Self::from_sources(file.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve every option from `env` first, then `file`, then the default.
    pub fn from_sources<F>(
        file: Option<&serde_json::Map<String, serde_json::Value>>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &'static str| -> Option<String> {
            env(key).or_else(|| file.and_then(|map| map.get(key)).and_then(json_text))
        };
        let defaults = Self::default();

        let ai_url = lookup("AI_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let think = match lookup("THINK_MS") {
            Some(raw) => Duration::from_millis(parse_number("THINK_MS", &raw)?),
            None => defaults.think,
        };

        let timeout = match lookup("TIMEOUT") {
            Some(raw) => parse_seconds("TIMEOUT", &raw)?,
            None => defaults.timeout,
        };

        let retry_attempts = match lookup("RETRY_ATTEMPTS") {
            Some(raw) => {
                let attempts: u32 = parse_number("RETRY_ATTEMPTS", &raw)?;
                if attempts == 0 {
                    return Err(invalid("RETRY_ATTEMPTS", &raw, "must be at least 1"));
                }
                attempts
            }
            None => defaults.retry_attempts,
        };

        let retry_backoff = match lookup("RETRY_BACKOFF_MS") {
            Some(raw) => Duration::from_millis(parse_number("RETRY_BACKOFF_MS", &raw)?),
            None => defaults.retry_backoff,
        };

        let fallback = match lookup("AI_FALLBACK") {
            Some(raw) => raw
                .parse()
                .map_err(|reason| invalid("AI_FALLBACK", &raw, reason))?,
            None => defaults.fallback,
        };

        Ok(Self {
            ai_url,
            api_key: lookup("API_KEY").unwrap_or(defaults.api_key),
            think,
            timeout,
            retry_attempts,
            retry_backoff,
            fallback,
            log_dir: lookup("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        })
    }

    /// Client settings for the remote service, if one is configured.
    pub fn remote_ai_config(&self) -> Option<RemoteAiConfig> {
        let url = self.ai_url.as_ref()?;
        Some(RemoteAiConfig {
            api_key: Some(self.api_key.clone()),
            timeout: self.timeout,
            retry: RetryPolicy::new(self.retry_attempts, self.retry_backoff),
            ..RemoteAiConfig::new(url.clone())
        })
    }
}

fn read_file(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str(&text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(ConfigError::NotAnObject(path.to_path_buf())),
        Err(source) => Err(ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Config files write numbers either bare or quoted; treat both as text.
fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, raw, e.to_string()))
}

fn parse_seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = parse_number(key, raw)?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid(key, raw, "must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(key, raw, e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}
