use thiserror::Error;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use xr_fetch::Ttls;

const DEFAULT_CACHE_MAX_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("XR_BEARER_TOKEN must be set")]
    MissingToken,
    #[error("Cannot determine a default for {0}, set it explicitly")]
    NoDefaultDir(&'static str),
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bearer_token: Option<String>,
    pub cache_enabled: bool,
    pub ttl: Ttls,
    /// Bytes.
    pub cache_max_size: u64,
    pub cache_path: PathBuf,
    pub save_dir: PathBuf,
    pub client_log_dir: Option<PathBuf>,
    pub max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Ttls::default();

        let ttl = Ttls {
            tweets: seconds(&var, "XR_CACHE_TTL_TWEETS", defaults.tweets)?,
            users: seconds(&var, "XR_CACHE_TTL_USERS", defaults.users)?,
            searches: seconds(&var, "XR_CACHE_TTL_SEARCHES", defaults.searches)?,
            counts: seconds(&var, "XR_CACHE_TTL_COUNTS", defaults.counts)?,
        };

        let cache_path = match var("XR_CACHE_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs::cache_dir()
                .map(|dir| dir.join("xr").join("cache.db"))
                .ok_or(ConfigError::NoDefaultDir("XR_CACHE_PATH"))?,
        };
        let save_dir = match var("XR_SAVE_DIR") {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .map(|dir| dir.join("xr"))
                .ok_or(ConfigError::NoDefaultDir("XR_SAVE_DIR"))?,
        };

        Ok(Config {
            bearer_token: var("XR_BEARER_TOKEN"),
            cache_enabled: match var("XR_CACHE_ENABLED") {
                Some(value) => parse_bool("XR_CACHE_ENABLED", &value)?,
                None => true,
            },
            ttl,
            cache_max_size: parse(&var, "XR_CACHE_MAX_SIZE")?.unwrap_or(DEFAULT_CACHE_MAX_SIZE),
            cache_path,
            save_dir,
            client_log_dir: var("XR_CLIENT_LOG_DIR").map(PathBuf::from),
            max_attempts: attempts(&var, "XR_MAX_ATTEMPTS")?,
        })
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::Invalid {
                var: name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn seconds(var: &impl Fn(&str) -> Option<String>, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    Ok(parse::<u64>(var, name)?.map(Duration::from_secs).unwrap_or(default))
}

/// Total requests per call, including the first. At least one.
fn attempts(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<u32, ConfigError> {
    match parse::<u32>(var, name)? {
        Some(0) => Err(ConfigError::Invalid {
            var: name,
            value: "0".to_string(),
            reason: "at least one attempt is required".to_string(),
        }),
        Some(attempts) => Ok(attempts),
        None => Ok(x_client::DEFAULT_MAX_ATTEMPTS),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("XR_CACHE_PATH", "/tmp/xr.db"), ("XR_SAVE_DIR", "/tmp/xr")]).unwrap();
        assert_eq!(config.bearer_token, None);
        assert!(config.cache_enabled);
        assert_eq!(config.ttl, Ttls::default());
        assert_eq!(config.ttl.tweets, Duration::from_secs(604_800));
        assert_eq!(config.cache_max_size, 50 * 1024 * 1024);
        assert_eq!(config.cache_path, PathBuf::from("/tmp/xr.db"));
        assert_eq!(config.client_log_dir, None);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("XR_BEARER_TOKEN", " token "),
            ("XR_CACHE_ENABLED", "off"),
            ("XR_CACHE_TTL_SEARCHES", "60"),
            ("XR_CACHE_MAX_SIZE", "1024"),
            ("XR_CACHE_PATH", "/tmp/xr.db"),
            ("XR_SAVE_DIR", "/tmp/xr"),
            ("XR_CLIENT_LOG_DIR", "/tmp/logs"),
            ("XR_MAX_ATTEMPTS", "5"),
        ])
        .unwrap();
        assert_eq!(config.bearer_token.as_deref(), Some("token"));
        assert!(!config.cache_enabled);
        assert_eq!(config.ttl.searches, Duration::from_secs(60));
        assert_eq!(config.ttl.users, Duration::from_secs(86_400));
        assert_eq!(config.cache_max_size, 1024);
        assert_eq!(config.client_log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn test_invalid_values() {
        let err = config(&[("XR_CACHE_TTL_TWEETS", "a week")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "XR_CACHE_TTL_TWEETS", .. }));

        let err = config(&[
            ("XR_CACHE_ENABLED", "maybe"),
            ("XR_CACHE_PATH", "/tmp/xr.db"),
            ("XR_SAVE_DIR", "/tmp/xr"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "XR_CACHE_ENABLED", .. }));

        let err = config(&[
            ("XR_MAX_ATTEMPTS", "0"),
            ("XR_CACHE_PATH", "/tmp/xr.db"),
            ("XR_SAVE_DIR", "/tmp/xr"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "XR_MAX_ATTEMPTS", .. }));
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config = config(&[
            ("XR_BEARER_TOKEN", ""),
            ("XR_MAX_ATTEMPTS", " "),
            ("XR_CACHE_PATH", "/tmp/xr.db"),
            ("XR_SAVE_DIR", "/tmp/xr"),
        ])
        .unwrap();
        assert_eq!(config.bearer_token, None);
        assert_eq!(config.max_attempts, 3);
    }
}
