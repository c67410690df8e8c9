//! Core types for the Pulse Series pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: parsed samples, resampled points, bridged points, and the decorated
//! chart points handed to the rendering layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SeriesError;
use crate::timestamp::serde_millis;

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;

/// Milliseconds in one hour
pub const HOUR_MS: i64 = 3_600_000;

/// Selectable dashboard window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimeRange {
    Day1,
    Days3,
    Days7,
    Days10,
    Days30,
}

impl TimeRange {
    /// All supported windows, shortest first
    pub const ALL: [TimeRange; 5] = [
        TimeRange::Day1,
        TimeRange::Days3,
        TimeRange::Days7,
        TimeRange::Days10,
        TimeRange::Days30,
    ];

    pub fn days(&self) -> u32 {
        match self {
            TimeRange::Day1 => 1,
            TimeRange::Days3 => 3,
            TimeRange::Days7 => 7,
            TimeRange::Days10 => 10,
            TimeRange::Days30 => 30,
        }
    }

    /// Window length in milliseconds
    pub fn duration_ms(&self) -> i64 {
        i64::from(self.days()) * DAY_MS
    }
}

impl TryFrom<u32> for TimeRange {
    type Error = SeriesError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            1 => Ok(TimeRange::Day1),
            3 => Ok(TimeRange::Days3),
            7 => Ok(TimeRange::Days7),
            10 => Ok(TimeRange::Days10),
            30 => Ok(TimeRange::Days30),
            other => Err(SeriesError::UnsupportedRange(other)),
        }
    }
}

impl From<TimeRange> for u32 {
    fn from(range: TimeRange) -> Self {
        range.days()
    }
}

impl FromStr for TimeRange {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('d');
        let days: u32 = trimmed
            .parse()
            .map_err(|_| SeriesError::InvalidRange(s.to_string()))?;
        TimeRange::try_from(days)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// Biometric signal plotted on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HeartRate,
    Hrv,
    Stress,
    BloodOxygen,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::HeartRate,
        Metric::Hrv,
        Metric::Stress,
        Metric::BloodOxygen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::HeartRate => "heart_rate",
            Metric::Hrv => "hrv",
            Metric::Stress => "stress",
            Metric::BloodOxygen => "blood_oxygen",
        }
    }

    /// Name of the timestamp field in backend records
    pub fn time_field(&self) -> &'static str {
        match self {
            Metric::HeartRate => "timestamp",
            Metric::Hrv | Metric::Stress | Metric::BloodOxygen => "date",
        }
    }

    /// Name of the value field in backend records
    pub fn value_field(&self) -> &'static str {
        match self {
            Metric::HeartRate => "bpm",
            Metric::Hrv => "hrv",
            Metric::Stress => "stress",
            Metric::BloodOxygen => "soa2",
        }
    }

    /// Display unit, empty for unitless scores
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::HeartRate => "bpm",
            Metric::Hrv => "ms",
            Metric::Stress => "",
            Metric::BloodOxygen => "%",
        }
    }

    /// Default maximum gap bridged by interpolation.
    ///
    /// Heart rate is sampled densely, so only short holes are bridged. The
    /// sparser metrics tolerate three hours.
    pub fn default_max_gap_ms(&self) -> i64 {
        match self {
            Metric::HeartRate => HOUR_MS,
            Metric::Hrv | Metric::Stress | Metric::BloodOxygen => 3 * HOUR_MS,
        }
    }

    /// Y-axis range used when a series carries no data at all
    pub fn nominal_range(&self) -> (f64, f64) {
        match self {
            Metric::HeartRate => (60.0, 100.0),
            Metric::Hrv => (20.0, 100.0),
            Metric::Stress => (0.0, 100.0),
            Metric::BloodOxygen => (90.0, 100.0),
        }
    }
}

impl FromStr for Metric {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "heart_rate" | "heartrate" | "hr" | "bpm" => Ok(Metric::HeartRate),
            "hrv" => Ok(Metric::Hrv),
            "stress" => Ok(Metric::Stress),
            "blood_oxygen" | "bloodoxygen" | "spo2" | "soa2" | "oxygen" => Ok(Metric::BloodOxygen),
            _ => Err(SeriesError::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw measurement with a parsed instant.
///
/// `value` is `None` when the device produced no reading; non-positive values
/// are carried through untouched and treated as absent by the resampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "serde_millis")]
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { time, value }
    }

    /// Value if it counts as a genuine reading
    pub fn valid_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// One point of the regular series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampledPoint {
    #[serde(with = "serde_millis")]
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

impl ResampledPoint {
    pub fn is_genuine(&self) -> bool {
        self.value.is_some()
    }
}

/// Resampled point plus the value drawn by the dashed overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgedPoint {
    #[serde(with = "serde_millis")]
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
    pub dashed_value: Option<f64>,
}

impl BridgedPoint {
    /// True when the dashed value was synthesized rather than observed
    pub fn is_interpolated(&self) -> bool {
        self.value.is_none() && self.dashed_value.is_some()
    }
}

/// Bridged point decorated with display labels for the chart layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    #[serde(with = "serde_millis")]
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
    pub dashed_value: Option<f64>,
    pub interpolated: bool,
    pub display_label: String,
    pub full_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_time_range_parsing() {
        assert_eq!("7".parse::<TimeRange>().unwrap(), TimeRange::Days7);
        assert_eq!(" 30d ".parse::<TimeRange>().unwrap(), TimeRange::Days30);
        assert!(matches!(
            "5".parse::<TimeRange>(),
            Err(SeriesError::UnsupportedRange(5))
        ));
        assert!(matches!(
            "week".parse::<TimeRange>(),
            Err(SeriesError::InvalidRange(_))
        ));
        assert_eq!(TimeRange::Days10.to_string(), "10d");
    }

    #[test]
    fn test_time_range_serializes_as_days() {
        assert_eq!(serde_json::to_string(&TimeRange::Days3).unwrap(), "3");
        let parsed: TimeRange = serde_json::from_str("10").unwrap();
        assert_eq!(parsed, TimeRange::Days10);
        assert!(serde_json::from_str::<TimeRange>("2").is_err());
    }

    #[test]
    fn test_metric_aliases() {
        assert_eq!("heart-rate".parse::<Metric>().unwrap(), Metric::HeartRate);
        assert_eq!("SpO2".parse::<Metric>().unwrap(), Metric::BloodOxygen);
        assert!("steps".parse::<Metric>().is_err());
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_sample_valid_value() {
        let time = DateTime::from_timestamp_millis(0).unwrap();
        assert_eq!(Sample::new(time, Some(72.0)).valid_value(), Some(72.0));
        assert_eq!(Sample::new(time, Some(0.0)).valid_value(), None);
        assert_eq!(Sample::new(time, Some(-3.0)).valid_value(), None);
        assert_eq!(Sample::new(time, Some(f64::NAN)).valid_value(), None);
        assert_eq!(Sample::new(time, None).valid_value(), None);
    }
}
