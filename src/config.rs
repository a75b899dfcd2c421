//! Engine configuration
//!
//! Every threshold that callers may reasonably tune lives here. Missing TOML
//! fields fall back to the defaults, so an empty file is a valid config.
//!
//! # Example
//! ```
//! use veredicto::config::EngineConfig;
//!
//! let config: EngineConfig = toml::from_str("significance_level = 0.1").unwrap();
//! assert_eq!(config.significance_level, 0.1);
//! assert_eq!(config.baseline_window_days, 28);
//! assert!(config.validate().is_ok());
//! ```

use crate::baseline::BaselineOptions;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trailing window of the personal baseline
    pub baseline_window_days: u32,

    /// Minimum samples for a baseline, before and after outlier removal
    pub min_data_points: usize,

    /// Length of the pre-protocol comparison period
    pub pre_window_days: u32,

    /// Alpha for Welch's t-test when grading positive signals
    ///
    /// - 0.05 (default): 95% confidence
    /// - 0.01: stricter, fewer false positives
    pub significance_level: f64,

    /// Alpha of the strict robustness scenario
    pub strict_significance_level: f64,

    /// Days scanned by the signal classifier
    pub signal_lookback_days: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_window_days: 28,
            min_data_points: 5,
            pre_window_days: 28,
            significance_level: 0.05,
            strict_significance_level: 0.01,
            signal_lookback_days: 7,
        }
    }
}

impl EngineConfig {
    /// Stricter significance and a larger minimum sample
    pub fn strict() -> Self {
        Self {
            min_data_points: 10,
            significance_level: 0.01,
            strict_significance_level: 0.001,
            ..Self::default()
        }
    }

    /// Read and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn baseline_options(&self) -> BaselineOptions {
        BaselineOptions {
            window_days: self.baseline_window_days,
            min_data_points: self.min_data_points,
        }
    }

    pub fn validate(&self) -> Result<()> {
        fn unit_interval(field: &'static str, value: f64) -> Result<()> {
            if value > 0.0 && value < 1.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be in (0, 1), got {value}"),
                })
            }
        }

        unit_interval("significance_level", self.significance_level)?;
        unit_interval("strict_significance_level", self.strict_significance_level)?;

        if self.strict_significance_level > self.significance_level {
            return Err(ConfigError::Invalid {
                field: "strict_significance_level",
                reason: format!(
                    "must not exceed significance_level ({}), got {}",
                    self.significance_level, self.strict_significance_level
                ),
            });
        }

        if self.min_data_points < 2 {
            return Err(ConfigError::Invalid {
                field: "min_data_points",
                reason: format!("must be >= 2, got {}", self.min_data_points),
            });
        }

        if self.baseline_window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "baseline_window_days",
                reason: "must be positive".to_string(),
            });
        }

        if self.pre_window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "pre_window_days",
                reason: "must be positive".to_string(),
            });
        }

        if self.signal_lookback_days == 0 {
            return Err(ConfigError::Invalid {
                field: "signal_lookback_days",
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }
}
