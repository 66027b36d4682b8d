//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SWEEP_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid SERVER_ADDR {value:?}: {source}")]
    InvalidAddress {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("Invalid {key} {value:?}: {source}")]
    InvalidNumber {
        key: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Close lobbies with no activity for this long; `None` keeps them forever
    pub idle_timeout: Option<Duration>,
    pub sweep_interval: Duration,
}

impl ServerConfig {
    /// Read `SERVER_ADDR`, `LOBBY_IDLE_TIMEOUT_SECS` and `LOBBY_SWEEP_INTERVAL_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_value = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr_value
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                value: addr_value.clone(),
                source,
            })?;

        let idle_timeout = seconds(&lookup, "LOBBY_IDLE_TIMEOUT_SECS")?;
        let sweep_interval = seconds(&lookup, "LOBBY_SWEEP_INTERVAL_SECS")?
            .unwrap_or(Duration::from_secs(DEFAULT_SWEEP_SECS));

        Ok(Self {
            addr,
            idle_timeout,
            sweep_interval,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            idle_timeout: None,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
        }
    }
}

fn seconds<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidNumber { key, value: value.clone(), source })?;
    if secs == 0 {
        return Err(ConfigError::Zero(key));
    }
    Ok(Some(Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_idle_timeout() {
        let cfg = config(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("LOBBY_IDLE_TIMEOUT_SECS", "600"),
            ("LOBBY_SWEEP_INTERVAL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.addr.port(), 9000);
        assert_eq!(cfg.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("SERVER_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            config(&[("LOBBY_IDLE_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config(&[("LOBBY_SWEEP_INTERVAL_SECS", "0")]),
            Err(ConfigError::Zero(_))
        ));
    }
}
