//! Layered run configuration.
//!
//! Precedence, lowest first:
//! 1. built-in defaults
//! 2. TOML config file (`$XDG_CONFIG_HOME/author-gender/config.toml`,
//!    `$HOME/.config/author-gender/config.toml`, or an explicit path)
//! 3. `AUTHOR_GENDER_API_KEY`
//! 4. command-line flags ([`SettingsOverrides`])

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::classify::{DEFAULT_CONFIDENCE_THRESHOLD, validate_threshold};
use crate::provider::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, DEFAULT_REQUEST_DELAY, LookupTimeouts,
    ProviderKind,
};
use crate::records::ColumnMapping;

/// Environment variable holding the lookup API key.
pub const API_KEY_ENV: &str = "AUTHOR_GENDER_API_KEY";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "assessed";

/// Default input export, relative to the working directory.
pub const DEFAULT_INPUT_FILE: &str = "womenLib.csv";

/// Largest accepted `request_delay_ms`.
const MAX_REQUEST_DELAY_MS: u64 = 60_000;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    fn out_of_range(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }

    /// Default tracing level for this setting.
    #[must_use]
    pub fn tracing_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    pub confidence_threshold: Option<f64>,
    pub request_delay_ms: Option<u64>,
    pub cache_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub title_column: Option<String>,
    pub year_column: Option<String>,
    pub author_column: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.confidence_threshold {
            validate_threshold(threshold).map_err(|_| {
                ConfigError::out_of_range("confidence_threshold", threshold, "0.0..=1.0")
            })?;
        }
        if let Some(delay) = self.request_delay_ms
            && delay > MAX_REQUEST_DELAY_MS
        {
            return Err(ConfigError::out_of_range(
                "request_delay_ms",
                delay,
                "0..=60000",
            ));
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    /// Input column names, falling back to the export defaults.
    #[must_use]
    pub fn column_mapping(&self) -> ColumnMapping {
        let defaults = ColumnMapping::default();
        ColumnMapping {
            title: self.title_column.clone().unwrap_or(defaults.title),
            year: self.year_column.clone().unwrap_or(defaults.year),
            authors: self.author_column.clone().unwrap_or(defaults.authors),
        }
    }
}

fn validate_timeout_secs(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    match value {
        Some(secs) if !(1..=3600).contains(&secs) => {
            Err(ConfigError::out_of_range(field, secs, "1..=3600"))
        }
        _ => Ok(()),
    }
}

/// Parses and validates config text.
///
/// # Errors
///
/// Returns [`ConfigError`] for invalid TOML, unknown keys or out-of-range values.
pub fn parse_config_str(raw: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    let config: FileConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or is invalid.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&raw, path)
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path, if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Indicates whether configuration was loaded from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/author-gender/config.toml`
/// 2. `$HOME/.config/author-gender/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("author-gender")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("author-gender")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default path is optional: when it is
/// missing, no file config applies.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or is invalid.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(load_file_config(path)?),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub confidence_threshold: Option<f64>,
    pub request_delay_ms: Option<u64>,
    pub cache_path: Option<PathBuf>,
}

/// Fully resolved settings for one assessment run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub cache_path: PathBuf,
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub confidence_threshold: f64,
    pub request_delay: Duration,
    pub columns: ColumnMapping,
    pub timeouts: LookupTimeouts,
}

impl Settings {
    /// Merges defaults, file config, the environment API key and CLI overrides.
    ///
    /// The cache defaults to `gender_cache.json` inside the resolved output
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] when a CLI value is out of range.
    pub fn resolve(
        file: Option<&FileConfig>,
        env_api_key: Option<String>,
        overrides: SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        let file = file.cloned().unwrap_or_default();
        let columns = file.column_mapping();

        let confidence_threshold = overrides
            .confidence_threshold
            .or(file.confidence_threshold)
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);
        validate_threshold(confidence_threshold).map_err(|_| {
            ConfigError::out_of_range("threshold", confidence_threshold, "0.0..=1.0")
        })?;

        let delay_ms = overrides
            .request_delay_ms
            .or(file.request_delay_ms)
            .unwrap_or_else(|| u64::try_from(DEFAULT_REQUEST_DELAY.as_millis()).unwrap_or(1000));
        if delay_ms > MAX_REQUEST_DELAY_MS {
            return Err(ConfigError::out_of_range("delay-ms", delay_ms, "0..=60000"));
        }

        let output_dir = overrides
            .output_dir
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let cache_path = overrides
            .cache_path
            .or(file.cache_path)
            .unwrap_or_else(|| output_dir.join(DEFAULT_CACHE_FILE));

        let api_key = overrides
            .api_key
            .or(env_api_key)
            .or(file.api_key)
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            input: overrides
                .input
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE)),
            output_dir,
            cache_path,
            provider: overrides.provider.or(file.provider).unwrap_or_default(),
            api_key,
            base_url: overrides.base_url.or(file.base_url),
            confidence_threshold,
            request_delay: Duration::from_millis(delay_ms),
            columns,
            timeouts: LookupTimeouts {
                connect_secs: file
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
                read_secs: file.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
            },
        })
    }
}
