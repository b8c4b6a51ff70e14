//! Reading harvest configuration from disk
//!
//! The file is read once per load. Parsing, validation and the integrity hash
//! all work on that same text.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Parses and validates configuration text
///
/// # Arguments
///
/// * `content` - TOML text with `[listing]`, `[fetch]`, `[headers]` and `[output]` tables
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config = toml::from_str::<Config>(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads a configuration file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Parsed configuration that passed validation
/// * `Err(ConfigError)` - The file could not be read, parsed or validated
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Workers: {}", config.fetch.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&fs::read_to_string(path)?)
}

/// Hex SHA-256 of a configuration file, as logged at start-up
///
/// Two snapshots produced with the same hash came from identical settings.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(content_hash(&fs::read_to_string(path)?))
}

/// Loads a configuration together with the hash of the text it came from
///
/// # Returns
///
/// * `Ok((Config, String))` - The configuration and its hex SHA-256
/// * `Err(ConfigError)` - The file could not be read, parsed or validated
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, content_hash(&content)))
}

fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
