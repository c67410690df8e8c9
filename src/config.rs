//! Pipeline configuration
//!
//! Every threshold the dashboard used to hard-code lives here: the pass-through
//! cutoff for short windows, bucket widths, per-metric bridging gaps, the
//! display offset, and the poll intervals.

use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{SeriesError, ValidationError};
use crate::timestamp::offset_from_minutes;
use crate::types::{Metric, TimeRange, HOUR_MS};

/// Largest UTC offset accepted for display labels (minutes)
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resample: ResampleConfig,
    pub gaps: GapConfig,
    pub display: DisplayConfig,
    pub refresh: RefreshConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SeriesError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SeriesError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SeriesError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load and validate configuration from a TOML file
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, SeriesError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String, SeriesError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section, collecting all field errors.
    ///
    /// ```
    /// use pulse_series::Config;
    ///
    /// Config::default().validate().expect("default config is valid");
    /// ```
    pub fn validate(&self) -> Result<(), SeriesError> {
        let mut errors = Vec::new();
        errors.extend(self.resample.validate());
        errors.extend(self.gaps.validate());
        errors.extend(self.display.validate());
        errors.extend(self.refresh.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SeriesError::ConfigValidation(errors))
        }
    }
}

/// Bucketing thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Windows up to this many days may skip bucketing
    pub passthrough_max_days: u32,
    /// Pass-through only applies below this many samples
    pub passthrough_max_samples: usize,
    /// Bucket width for windows up to `long_step_after_days` (ms)
    pub short_step_ms: i64,
    /// Bucket width for longer windows (ms)
    pub long_step_ms: i64,
    /// Windows longer than this many days use `long_step_ms`
    pub long_step_after_days: u32,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            passthrough_max_days: 1,
            passthrough_max_samples: 500,
            short_step_ms: HOUR_MS,
            long_step_ms: 2 * HOUR_MS,
            long_step_after_days: 7,
        }
    }
}

impl ResampleConfig {
    /// Bucket width used for `range` when bucketing applies
    pub fn step_ms(&self, range: TimeRange) -> i64 {
        if range.days() > self.long_step_after_days {
            self.long_step_ms
        } else {
            self.short_step_ms
        }
    }

    /// Whether `sample_count` filtered samples are passed through unbucketed
    pub fn is_passthrough(&self, range: TimeRange, sample_count: usize) -> bool {
        range.days() <= self.passthrough_max_days && sample_count < self.passthrough_max_samples
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.short_step_ms <= 0 {
            errors.push(ValidationError {
                field: "resample.short_step_ms".to_string(),
                message: "bucket width must be positive".to_string(),
            });
        }
        if self.long_step_ms <= 0 {
            errors.push(ValidationError {
                field: "resample.long_step_ms".to_string(),
                message: "bucket width must be positive".to_string(),
            });
        }
        errors
    }
}

/// Maximum time gap bridged by interpolation, per metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    pub heart_rate_max_gap_ms: i64,
    pub hrv_max_gap_ms: i64,
    pub stress_max_gap_ms: i64,
    pub blood_oxygen_max_gap_ms: i64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            heart_rate_max_gap_ms: Metric::HeartRate.default_max_gap_ms(),
            hrv_max_gap_ms: Metric::Hrv.default_max_gap_ms(),
            stress_max_gap_ms: Metric::Stress.default_max_gap_ms(),
            blood_oxygen_max_gap_ms: Metric::BloodOxygen.default_max_gap_ms(),
        }
    }
}

impl GapConfig {
    pub fn max_gap_ms(&self, metric: Metric) -> i64 {
        match metric {
            Metric::HeartRate => self.heart_rate_max_gap_ms,
            Metric::Hrv => self.hrv_max_gap_ms,
            Metric::Stress => self.stress_max_gap_ms,
            Metric::BloodOxygen => self.blood_oxygen_max_gap_ms,
        }
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        Metric::ALL
            .iter()
            .filter(|metric| self.max_gap_ms(**metric) <= 0)
            .map(|metric| ValidationError {
                field: format!("gaps.{}_max_gap_ms", metric.as_str()),
                message: "maximum gap must be positive".to_string(),
            })
            .collect()
    }
}

/// Label formatting settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Offset east of UTC used for labels and for naive timestamps (minutes)
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes)
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            vec![ValidationError {
                field: "display.utc_offset_minutes".to_string(),
                message: format!(
                    "offset {} is outside -{MAX_OFFSET_MINUTES}..={MAX_OFFSET_MINUTES}",
                    self.utc_offset_minutes
                ),
            }]
        } else {
            Vec::new()
        }
    }
}

/// Poll cadence of the surrounding dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Full dataset refresh (seconds)
    pub dataset_interval_secs: u64,
    /// Latest realtime value probe (seconds)
    pub realtime_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            dataset_interval_secs: 30,
            realtime_interval_secs: 5,
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.dataset_interval_secs == 0 {
            errors.push(ValidationError {
                field: "refresh.dataset_interval_secs".to_string(),
                message: "interval must be at least 1 second".to_string(),
            });
        }
        if self.realtime_interval_secs == 0 {
            errors.push(ValidationError {
                field: "refresh.realtime_interval_secs".to_string(),
                message: "interval must be at least 1 second".to_string(),
            });
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_step_selection() {
        let config = ResampleConfig::default();
        assert_eq!(config.step_ms(TimeRange::Day1), HOUR_MS);
        assert_eq!(config.step_ms(TimeRange::Days3), HOUR_MS);
        assert_eq!(config.step_ms(TimeRange::Days7), HOUR_MS);
        assert_eq!(config.step_ms(TimeRange::Days10), 2 * HOUR_MS);
        assert_eq!(config.step_ms(TimeRange::Days30), 2 * HOUR_MS);
    }

    #[test]
    fn test_passthrough_threshold() {
        let config = ResampleConfig::default();
        assert!(config.is_passthrough(TimeRange::Day1, 0));
        assert!(config.is_passthrough(TimeRange::Day1, 499));
        assert!(!config.is_passthrough(TimeRange::Day1, 500));
        assert!(!config.is_passthrough(TimeRange::Days3, 10));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gaps]
            heart_rate_max_gap_ms = 1800000

            [display]
            utc_offset_minutes = 480
            "#,
        )
        .unwrap();

        assert_eq!(config.gaps.max_gap_ms(Metric::HeartRate), 1_800_000);
        assert_eq!(config.gaps.max_gap_ms(Metric::Hrv), 3 * HOUR_MS);
        assert_eq!(config.resample, ResampleConfig::default());
        assert_eq!(config.display.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.resample.short_step_ms = 0;
        config.gaps.stress_max_gap_ms = -1;
        config.display.utc_offset_minutes = 20 * 60;
        config.refresh.realtime_interval_secs = 0;

        match config.validate() {
            Err(SeriesError::ConfigValidation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    vec![
                        "resample.short_step_ms",
                        "gaps.stress_max_gap_ms",
                        "display.utc_offset_minutes",
                        "refresh.realtime_interval_secs",
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
