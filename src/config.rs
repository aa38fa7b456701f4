//! Configuration loader and validator.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the TOML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub store: Store,
    #[serde(default)]
    pub fetch: Fetch,
    pub apartments: Vec<Apartment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fetch {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Fetch {
    fn default() -> Self {
        Fetch {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// One apartment and its external calendar feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Apartment {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
}

/// Load configuration from a TOML file and validate it.
/// If `path` is None, uses `lodgesync.toml` in the current directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("lodgesync.toml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.store.database_url.trim().is_empty() {
        return Err(ConfigError::Invalid("store.database_url must be non-empty"));
    }
    if cfg.fetch.timeout_secs == 0 {
        return Err(ConfigError::Invalid("fetch.timeout_secs must be > 0"));
    }
    if cfg.apartments.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one [[apartments]] entry is required",
        ));
    }

    let mut seen = HashSet::new();
    for apartment in &cfg.apartments {
        if apartment.name.trim().is_empty() {
            return Err(ConfigError::Invalid("apartments.name must be non-empty"));
        }
        if apartment.feed_url.trim().is_empty() {
            return Err(ConfigError::Invalid("apartments.feed_url must be non-empty"));
        }
        if !seen.insert(apartment.id) {
            return Err(ConfigError::Invalid("apartments.id values must be unique"));
        }
    }

    Ok(())
}

/// Example configuration, also exercised by the tests.
pub fn example() -> &'static str {
    r#"[store]
database_url = "sqlite://lodgesync.db"

[fetch]
timeout_secs = 30

[[apartments]]
id = 1
name = "Seaside 2B"
feed_url = "https://www.airbnb.com/calendar/ical/12345.ics?s=abcdef"

[[apartments]]
id = 2
name = "Old Town Loft"
feed_url = "https://admin.booking.com/hotel/hoteladmin/ical.html?t=fedcba"
"#
}
