//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{
    RelaySet,
    error::{Error, Result},
};

/// Relays queried when an identity has not published a relay list
pub const DEFAULT_RELAYS: [&str; 4] = [
    "wss://relay.damus.io",
    "wss://relay.nostr.band",
    "wss://nos.lol",
    "wss://relay.primal.net",
];

pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Engine settings, loadable from TOML
///
/// Every field is optional in the file; missing fields take their defaults.
///
/// ```toml
/// default_relays = ["wss://nos.lol"]
/// query_timeout_ms = 3000
/// window_days = 14
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Fallback relays, appended after an identity's own write relays
    pub default_relays: Vec<String>,
    /// Relays asked for relay lists
    pub bootstrap_relays: Vec<String>,
    /// Per-relay deadline for a query
    pub query_timeout_ms: u64,
    /// Per-relay deadline for a broadcast
    pub publish_timeout_ms: u64,
    /// Deadline for opening a WebSocket
    pub connect_timeout_ms: u64,
    /// Scoring window
    pub window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            bootstrap_relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            publish_timeout_ms: DEFAULT_PUBLISH_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.default_relays.is_empty() {
            return Err(Error::Config("default_relays must not be empty".to_string()));
        }
        for (name, value) in [
            ("query_timeout_ms", self.query_timeout_ms),
            ("publish_timeout_ms", self.publish_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }
        if self.window_days == 0 {
            return Err(Error::Config("window_days must be greater than zero".to_string()));
        }
        self.relay_sets().map(|_| ())
    }

    /// Parsed `(defaults, bootstrap)` relay sets
    ///
    /// An empty bootstrap list means "use the defaults".
    pub fn relay_sets(&self) -> Result<(RelaySet, RelaySet)> {
        let defaults = RelaySet::parse_all(&self.default_relays)?;
        let bootstrap = if self.bootstrap_relays.is_empty() {
            defaults.clone()
        } else {
            RelaySet::parse_all(&self.bootstrap_relays)?
        };
        Ok((defaults, bootstrap))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.default_relays.len(), 4);
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
        assert_eq!(config.publish_timeout(), Duration::from_secs(8));
        assert_eq!(config.window_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
default_relays = ["wss://relay.example.com/"]
bootstrap_relays = []
query_timeout_ms = 1500
"#,
        )
        .unwrap();

        assert_eq!(config.query_timeout_ms, 1500);
        assert_eq!(config.publish_timeout_ms, DEFAULT_PUBLISH_TIMEOUT_MS);

        let (defaults, bootstrap) = config.relay_sets().unwrap();
        assert_eq!(defaults.as_slice()[0].as_str(), "wss://relay.example.com");
        assert_eq!(bootstrap, defaults);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("window_days = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("default_relays = []"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str(r#"default_relays = ["https://web.example"]"#),
            Err(Error::InvalidRelayUrl(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("query_timeout_ms = \"fast\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window_days = 7").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.window_days, 7);
        assert!(EngineConfig::from_file("/nonexistent/relay-lens.toml").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig {
            window_days: 90,
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&toml_str).unwrap(), config);
    }
}
