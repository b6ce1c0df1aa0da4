//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Allowed client origins for CORS (comma-separated, `*` allows any)
    pub client_origin: String,
    /// Remote session service for match results; local store when unset
    pub stats_gateway_url: Option<String>,

    /// Idle lobbies older than this are swept (seconds)
    pub lobby_ttl_secs: u64,
    pub max_players_per_session: usize,
    /// Bots added to every hosted solo match
    pub solo_bot_count: usize,
    /// Relay messages per second accepted from one connection
    pub relay_rate_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            client_origin: "*".to_string(),
            stats_gateway_url: None,
            lobby_ttl_secs: 3600,
            max_players_per_session: 16,
            solo_bot_count: 15,
            relay_rate_limit: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| defaults.server_addr.to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
            stats_gateway_url: env::var("STATS_GATEWAY_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),

            lobby_ttl_secs: parse_var("LOBBY_TTL_SECS", defaults.lobby_ttl_secs)?,
            max_players_per_session: parse_var(
                "MAX_PLAYERS_PER_SESSION",
                defaults.max_players_per_session,
            )?,
            solo_bot_count: parse_var("SOLO_BOT_COUNT", defaults.solo_bot_count)?,
            relay_rate_limit: parse_var("RELAY_RATE_LIMIT", defaults.relay_rate_limit)?,
        })
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.client_origin.split(',').any(|o| o.trim() == "*")
    }
}

/// Read an optional numeric variable, keeping `default` when unset
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_are_validated() {
        assert_eq!(parse_value::<u64>("LOBBY_TTL_SECS", " 60 ").unwrap(), 60);
        assert!(matches!(
            parse_value::<usize>("SOLO_BOT_COUNT", "lots"),
            Err(ConfigError::Invalid("SOLO_BOT_COUNT"))
        ));
    }

    #[test]
    fn wildcard_origin_detection() {
        let mut config = Config::default();
        assert!(config.allows_any_origin());
        config.client_origin = "https://a.example, https://b.example".into();
        assert!(!config.allows_any_origin());
    }
}
