//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the sunspot lookup service,
//! supporting multiple sources (files, environment variables) with validation
//! and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, TTL ordering
//!
//! ## Key Features
//! - Nested configuration sections per component
//! - Automatic validation with detailed error messages
//! - Environment overrides under the `SUNSPOT_` prefix
//! - Sensible defaults so the service runs with no config file at all
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,ignore
//! use crate::config::Config;
//!
//! // Load from default locations
//! let config = Config::load()?;
//!
//! // Load from specific file
//! let config = Config::from_file("custom.toml")?;
//!
//! // Access configuration
//! println!("Server port: {}", config.server.port);
//! ```

use crate::errors::{LookupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Geocoding provider settings
    pub geocoding: GeocodingConfig,
    /// Sun-event provider settings
    pub sun: SunApiConfig,
    /// Cache behavior and backend selection
    pub cache: CacheConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
    /// Performance tuning
    pub performance: PerformanceConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Enable CORS
    pub enable_cors: bool,
}

/// Geocoding provider configuration (Nominatim wire format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// API base URL
    pub base_url: String,
    /// User agent sent with every request; Nominatim requires one
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum results requested per forward lookup
    pub result_limit: usize,
}

/// Sun-event provider configuration (sunrise-sunset.org wire format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunApiConfig {
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Store backend: "memory" or "sled"
    pub backend: String,
    /// TTL for lookups about the current day (seconds)
    pub ttl_today_seconds: u64,
    /// TTL for lookups about any other day (seconds); must exceed the
    /// today TTL, since settled days never change
    pub ttl_other_seconds: u64,
    /// Maximum entries held by the memory backend
    pub max_memory_entries: usize,
    /// Database path for the sled backend
    pub sled_path: PathBuf,
    /// Compress cached payloads in the sled backend
    pub enable_compression: bool,
}

impl CacheConfig {
    /// TTL applied when the resolved date is the current day
    pub fn ttl_today(&self) -> Duration {
        Duration::from_secs(self.ttl_today_seconds)
    }

    /// TTL applied when the resolved date is any other day
    pub fn ttl_other(&self) -> Duration {
        Duration::from_secs(self.ttl_other_seconds)
    }
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

/// Performance tuning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of worker threads for the HTTP server
    pub worker_threads: usize,
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| LookupError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| LookupError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // Server configuration
        if let Ok(host) = std::env::var("SUNSPOT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SUNSPOT_PORT") {
            self.server.port = port.parse().map_err(|_| LookupError::Config {
                message: "Invalid port number in SUNSPOT_PORT".to_string(),
            })?;
        }

        // Provider endpoints
        if let Ok(url) = std::env::var("SUNSPOT_GEOCODING_URL") {
            self.geocoding.base_url = url;
        }
        if let Ok(url) = std::env::var("SUNSPOT_SUN_API_URL") {
            self.sun.base_url = url;
        }

        // Cache configuration
        if let Ok(backend) = std::env::var("SUNSPOT_CACHE_BACKEND") {
            self.cache.backend = backend;
        }
        if let Ok(path) = std::env::var("SUNSPOT_SLED_PATH") {
            self.cache.sled_path = PathBuf::from(path);
        }

        // Logging
        if let Ok(level) = std::env::var("SUNSPOT_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(LookupError::Config {
                message: "server.port: port cannot be zero".to_string(),
            });
        }

        if !matches!(self.cache.backend.as_str(), "memory" | "sled") {
            return Err(LookupError::Config {
                message: format!(
                    "cache.backend: expected 'memory' or 'sled', got '{}'",
                    self.cache.backend
                ),
            });
        }

        if self.cache.ttl_today_seconds == 0 || self.cache.ttl_other_seconds == 0 {
            return Err(LookupError::Config {
                message: "cache TTLs must be greater than zero".to_string(),
            });
        }

        // Settled days outlive the current one; an inverted or equal pair
        // silently disables the long-lived tier, so reject it outright.
        if self.cache.ttl_today_seconds >= self.cache.ttl_other_seconds {
            return Err(LookupError::Config {
                message: format!(
                    "cache.ttl_other_seconds ({}) must exceed cache.ttl_today_seconds ({})",
                    self.cache.ttl_other_seconds, self.cache.ttl_today_seconds
                ),
            });
        }

        if self.geocoding.result_limit == 0 {
            return Err(LookupError::Config {
                message: "geocoding.result_limit: must be at least 1".to_string(),
            });
        }

        if self.performance.worker_threads == 0 {
            return Err(LookupError::Config {
                message: "performance.worker_threads: must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LookupError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_seconds: 30,
                enable_cors: true,
            },
            geocoding: GeocodingConfig {
                base_url: "https://nominatim.openstreetmap.org".to_string(),
                user_agent: "sunspot-service/0.1".to_string(),
                timeout_seconds: 10,
                result_limit: 1,
            },
            sun: SunApiConfig {
                base_url: "https://api.sunrise-sunset.org".to_string(),
                timeout_seconds: 10,
            },
            cache: CacheConfig {
                backend: "memory".to_string(),
                ttl_today_seconds: 3600,
                ttl_other_seconds: 86400,
                max_memory_entries: 10_000,
                sled_path: PathBuf::from("./data/sun_cache.db"),
                enable_compression: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
            performance: PerformanceConfig {
                worker_threads: num_cpus::get(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_ttl_inversion_rejected() {
        let mut config = Config::default();
        config.cache.ttl_today_seconds = 86400;
        config.cache.ttl_other_seconds = 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equal_ttls_rejected() {
        let mut config = Config::default();
        config.cache.ttl_today_seconds = 3600;
        config.cache.ttl_other_seconds = 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = Config::default();
        config.cache.backend = "redis".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let serialized = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.cache.ttl_other_seconds, config.cache.ttl_other_seconds);
        assert_eq!(parsed.geocoding.base_url, config.geocoding.base_url);
    }

    #[test]
    fn test_ttl_getters() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_today(), Duration::from_secs(3600));
        assert_eq!(config.cache.ttl_other(), Duration::from_secs(86400));
        assert!(config.cache.ttl_other() > config.cache.ttl_today());
    }
}
