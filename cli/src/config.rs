//! Estimator configuration layering.
//!
//! A JSON file (or the defaults) is read first, then `QPMU_*` environment variables,
//! then command-line flags; later layers win.

use qpmu_core::{EstimationStrategy, EstimatorConfig, Float, NominalFrequency};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

pub const ENV_WINDOW_SIZE: &str = "QPMU_WINDOW_SIZE";
pub const ENV_STRATEGY: &str = "QPMU_STRATEGY";
pub const ENV_NOMINAL_FREQUENCY: &str = "QPMU_NOMINAL_FREQUENCY";
pub const ENV_VOLTAGE_SCALE: &str = "QPMU_VOLTAGE_SCALE";
pub const ENV_VOLTAGE_OFFSET: &str = "QPMU_VOLTAGE_OFFSET";
pub const ENV_CURRENT_SCALE: &str = "QPMU_CURRENT_SCALE";
pub const ENV_CURRENT_OFFSET: &str = "QPMU_CURRENT_OFFSET";

/// Errors raised while assembling a configuration.
///
/// # Variants
///
/// * `Io`: The configuration file could not be read.
/// * `Json`: The configuration file is not a valid `EstimatorConfig`.
/// * `InvalidValue`: An environment variable holds an unparsable value.
#[derive(Debug)]
pub enum ConfigError {
    Io { message: String },
    Json { message: String },
    InvalidValue { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io { message } => write!(f, "Config I/O error: {}", message),
            ConfigError::Json { message } => write!(f, "Invalid config file: {}", message),
            ConfigError::InvalidValue { message } => write!(f, "Invalid value: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One layer of optional settings on top of an `EstimatorConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EstimatorOverrides {
    pub window_size: Option<usize>,
    pub strategy: Option<EstimationStrategy>,
    pub nominal_frequency: Option<NominalFrequency>,
    pub voltage_scale: Option<Float>,
    pub voltage_offset: Option<Float>,
    pub current_scale: Option<Float>,
    pub current_offset: Option<Float>,
}

impl EstimatorOverrides {
    /// Reads the `QPMU_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which returns the value of a variable if set.
    pub fn from_vars<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        Ok(EstimatorOverrides {
            window_size: parse_var(&lookup, ENV_WINDOW_SIZE)?,
            strategy: parse_var(&lookup, ENV_STRATEGY)?,
            nominal_frequency: parse_var(&lookup, ENV_NOMINAL_FREQUENCY)?,
            voltage_scale: parse_var(&lookup, ENV_VOLTAGE_SCALE)?,
            voltage_offset: parse_var(&lookup, ENV_VOLTAGE_OFFSET)?,
            current_scale: parse_var(&lookup, ENV_CURRENT_SCALE)?,
            current_offset: parse_var(&lookup, ENV_CURRENT_OFFSET)?,
        })
    }

    /// Writes every set value into `config`.
    pub fn apply(&self, config: &mut EstimatorConfig) {
        if let Some(window_size) = self.window_size {
            config.window_size = window_size;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(nominal_frequency) = self.nominal_frequency {
            config.nominal_frequency = nominal_frequency;
        }
        if let Some(scale) = self.voltage_scale {
            config.voltage.scale = scale;
        }
        if let Some(offset) = self.voltage_offset {
            config.voltage.offset = offset;
        }
        if let Some(scale) = self.current_scale {
            config.current.scale = scale;
        }
        if let Some(offset) = self.current_offset {
            config.current.offset = offset;
        }
    }
}

fn parse_var<T, L>(lookup: &L, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                message: format!("{}={:?}: {}", key, value, e),
            }),
    }
}

/// Loads an `EstimatorConfig` from a JSON file; missing fields take their defaults.
pub fn load_config_file(path: &Path) -> Result<EstimatorConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Json {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Builds the effective configuration: file (or defaults), then `env`, then `flags`.
pub fn resolve_config(
    file: Option<&Path>,
    env: &EstimatorOverrides,
    flags: &EstimatorOverrides,
) -> Result<EstimatorConfig, ConfigError> {
    let mut config = match file {
        Some(path) => load_config_file(path)?,
        None => EstimatorConfig::default(),
    };
    env.apply(&mut config);
    flags.apply(&mut config);
    Ok(config)
}
