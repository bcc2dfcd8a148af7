//! Configuration management.
//!
//! Defaults come from the environment (`API_BASE_URL`, `API_TIMEOUT`,
//! `MAX_RESULTS`, ...) and fall back to documented constants. A TOML file can
//! be layered on top with [`load_config`], where `OWLY_`-prefixed variables
//! take precedence over the file.
//!
//! ```toml
//! api_base_url = "https://openlibrary.org"
//! api_timeout_ms = 15000
//! max_results = 50
//!
//! [covers]
//! base_url = "https://covers.openlibrary.org"
//! timeout_ms = 2000
//!
//! [display]
//! error_display_ms = 5000
//! reveal_stagger_ms = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default catalog base URL
pub const DEFAULT_API_BASE_URL: &str = "https://openlibrary.org";

/// Default covers base URL
pub const DEFAULT_COVERS_BASE_URL: &str = "https://covers.openlibrary.org";

/// Placeholder shown for works without any cover identifier
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://openlibrary.org/images/icons/avatar_book-sm.png";

/// Substituted when a cover fails to load
pub const DEFAULT_FALLBACK_URL: &str = "https://openlibrary.org/images/icons/avatar_book-lg.png";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout for catalog calls, in milliseconds
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Maximum number of works requested and rendered per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Cover image settings
    #[serde(default)]
    pub covers: CoverConfig,

    /// Indicator and reveal timings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_timeout_ms: default_api_timeout_ms(),
            max_results: default_max_results(),
            covers: CoverConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Override the catalog base URL
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the catalog request timeout
    pub fn api_timeout_ms(mut self, ms: u64) -> Self {
        self.api_timeout_ms = ms;
        self
    }

    /// Override the result cap
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Catalog request timeout as a duration
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// Check that URLs parse and limits are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("covers.base_url", &self.covers.base_url),
            ("covers.placeholder_url", &self.covers.placeholder_url),
            ("covers.fallback_url", &self.covers.fallback_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
                field,
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }

        if self.api_timeout_ms == 0 {
            return Err(ConfigError::Invalid("api_timeout_ms must be positive".into()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::Invalid("max_results must be positive".into()));
        }
        Ok(())
    }
}

/// Cover image configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Base URL for `/b/id/..` and `/b/olid/..` cover paths
    #[serde(default = "default_covers_base_url")]
    pub base_url: String,

    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,

    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,

    /// Bounded wait for a single card's cover, in milliseconds
    #[serde(default = "default_cover_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            base_url: default_covers_base_url(),
            placeholder_url: default_placeholder_url(),
            fallback_url: default_fallback_url(),
            timeout_ms: default_cover_timeout_ms(),
        }
    }
}

impl CoverConfig {
    /// Bounded wait as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Indicator and reveal timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// How long a search error stays on the indicator
    #[serde(default = "default_error_display_ms")]
    pub error_display_ms: u64,

    /// Delay between revealing consecutive cards
    #[serde(default = "default_reveal_stagger_ms")]
    pub reveal_stagger_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            error_display_ms: default_error_display_ms(),
            reveal_stagger_ms: default_reveal_stagger_ms(),
        }
    }
}

impl DisplayConfig {
    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    pub fn reveal_stagger(&self) -> Duration {
        Duration::from_millis(self.reveal_stagger_ms)
    }
}

/// Read a non-empty string variable
fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a numeric variable; unparsable values are ignored
fn env_number<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn default_api_base_url() -> String {
    env_string("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

// Zero is treated like an unset value for the timeout and the result cap.
fn default_api_timeout_ms() -> u64 {
    env_number::<u64>("API_TIMEOUT")
        .filter(|ms| *ms > 0)
        .unwrap_or(15_000)
}

fn default_max_results() -> usize {
    env_number::<usize>("MAX_RESULTS")
        .filter(|n| *n > 0)
        .unwrap_or(50)
}

fn default_covers_base_url() -> String {
    env_string("COVERS_BASE_URL").unwrap_or_else(|| DEFAULT_COVERS_BASE_URL.to_string())
}

fn default_placeholder_url() -> String {
    DEFAULT_PLACEHOLDER_URL.to_string()
}

fn default_fallback_url() -> String {
    DEFAULT_FALLBACK_URL.to_string()
}

fn default_cover_timeout_ms() -> u64 {
    env_number::<u64>("COVER_TIMEOUT")
        .filter(|ms| *ms > 0)
        .unwrap_or(2_000)
}

fn default_error_display_ms() -> u64 {
    env_number("ERROR_DISPLAY_MS").unwrap_or(5_000)
}

fn default_reveal_stagger_ms() -> u64 {
    env_number("REVEAL_STAGGER_MS").unwrap_or(50)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid URL for {field} ({value}): {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from a file
///
/// `OWLY_`-prefixed environment variables override the file, with `__`
/// separating nested keys (`OWLY_COVERS__TIMEOUT_MS=500`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("OWLY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Look for `owly.toml` in the working directory, then in the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("owly.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("owly").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ..Config::default()
        };
        assert_eq!(config.api_base_url, "https://openlibrary.org");
        assert!(config.validate().is_ok());
        assert_eq!(config.covers.placeholder_url, DEFAULT_PLACEHOLDER_URL);
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .api_base_url("http://localhost:8080")
            .api_timeout_ms(250)
            .max_results(3);

        assert_eq!(config.api_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_results, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config::default().api_base_url("not a url");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "api_base_url", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = Config::default().max_results(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("owly.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            br#"
api_base_url = "http://127.0.0.1:9000"
max_results = 7

[covers]
timeout_ms = 300

[display]
reveal_stagger_ms = 0
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.max_results, 7);
        assert_eq!(config.covers.timeout_ms, 300);
        assert_eq!(config.display.reveal_stagger_ms, 0);
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "max_results = = 3").unwrap();

        assert!(load_config(&path).is_err());
    }
}
