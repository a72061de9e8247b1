use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::serialization::Format;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Common logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// The earthquake event being illustrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Display name of the event.
    #[serde(default)]
    pub name: String,

    /// Left edge of the waveform timeline.
    pub origin: DateTime<Utc>,

    /// Total duration in seconds; selects the cache file and sizes every fetch window.
    pub duration_secs: u64,
}

/// Longest accepted event duration: one leap year.
pub const MAX_DURATION_SECS: u64 = 366 * 86_400;

impl EventConfig {
    /// Right edge of the waveform timeline, saturating at the latest
    /// representable time.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.origin
            .checked_add_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn duration(&self) -> TimeDelta {
        duration(self.duration_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_secs == 0 {
            return Err(Error::validation("event.duration_secs must be > 0"));
        }
        if self.duration_secs > MAX_DURATION_SECS {
            return Err(Error::validation(format!(
                "event.duration_secs must be at most {}, got {}",
                MAX_DURATION_SECS, self.duration_secs
            )));
        }
        if self.origin.checked_add_signed(self.duration()).is_none() {
            return Err(Error::validation("event.origin + duration_secs is out of range"));
        }
        Ok(())
    }
}

/// `secs` as a [`TimeDelta`], saturating at [`TimeDelta::MAX`].
pub fn duration(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// Where and how fetched waveforms are cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding `waveforms_<seconds>.<ext>` files (default: current directory).
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// On-disk encoding (default: cbor).
    #[serde(default)]
    pub format: Format,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            format: Format::default(),
        }
    }
}

/// Trait for top-level configuration files.
///
/// Implementors get loading with a not-found check and validation after parsing.
pub trait ConfigFile: Sized + DeserializeOwned {
    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Validate the configuration.
    ///
    /// Called automatically after loading. Override to add custom validation.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load configuration from a JSON5 file and validate it.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let config: Self = load_config(path)?;
        config.validate()?;

        Ok(config)
    }
}

/// Load a configuration file in JSON5 format.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    json5::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Load a configuration from a JSON5 string.
pub fn parse_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    json5::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        logging: LoggingConfig,
        #[serde(default)]
        cache: CacheConfig,
        event: EventConfig,
    }

    impl ConfigFile for TestConfig {
        fn logging(&self) -> &LoggingConfig {
            &self.logging
        }

        fn validate(&self) -> Result<()> {
            self.event.validate()
        }
    }

    #[test]
    fn test_defaults() {
        let config: TestConfig = parse_config(
            r#"{ event: { origin: "2024-01-01T07:08:00Z", duration_secs: 1700 } }"#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.cache.dir, PathBuf::from("."));
        assert_eq!(config.cache.format, Format::Cbor);
        assert_eq!(
            config.event.window_end().to_rfc3339(),
            "2024-01-01T07:36:20+00:00"
        );
    }

    #[test]
    fn test_json_logging_and_cache() {
        let config: TestConfig = parse_config(
            r#"
            {
                logging: { level: "debug", format: "json" },
                cache: { dir: "/tmp/seis", format: "json" },
                event: { name: "Noto", origin: "2024-01-01T07:08:00Z", duration_secs: 60 },
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.cache.format, Format::Json);
        assert_eq!(config.event.name, "Noto");
    }

    #[test]
    fn test_config_not_found() {
        let result = TestConfig::load("/nonexistent/path.json5");
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json5");
        std::fs::write(
            &path,
            r#"{ event: { origin: "2024-01-01T07:08:00Z", duration_secs: 0 } }"#,
        )
        .unwrap();

        let result = TestConfig::load(&path);
        assert!(matches!(result, Err(Error::Validation(_))));
    }
    #[test]
    fn test_duration_is_bounded() {
        let event = |secs: u64| EventConfig {
            name: String::new(),
            origin: "2024-01-01T07:08:00Z".parse().unwrap(),
            duration_secs: secs,
        };

        assert!(event(MAX_DURATION_SECS).validate().is_ok());
        assert!(matches!(
            event(MAX_DURATION_SECS + 1).validate(),
            Err(Error::Validation(_))
        ));

        // Out-of-range durations are rejected, and never panic when used anyway.
        for secs in [10_000_000_000_000, u64::MAX] {
            let event = event(secs);
            assert!(matches!(event.validate(), Err(Error::Validation(_))));
            assert_eq!(event.window_end(), DateTime::<Utc>::MAX_UTC);
        }
        assert_eq!(duration(u64::MAX), TimeDelta::MAX);
        assert_eq!(duration(60), TimeDelta::seconds(60));
    }
}
