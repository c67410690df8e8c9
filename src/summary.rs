//! Chart summaries
//!
//! Card statistics and axis settings derived from a processed series. Only
//! genuine points feed the statistics; interpolated values are drawn but never
//! counted.

use serde::{Deserialize, Serialize};

use crate::types::{ChartPoint, TimeRange};

/// Padding added around the data range on the Y axis
const Y_PADDING: f64 = 10.0;

/// Mean, minimum and maximum over genuine points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Mean rounded to the nearest integer
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Number of genuine points
    pub count: usize,
}

impl MetricStats {
    /// Returns `None` when no point carries a genuine value
    pub fn from_points(points: &[ChartPoint]) -> Option<Self> {
        Self::from_values(points.iter().filter_map(|p| p.value))
    }

    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        (count > 0).then(|| Self {
            mean: (sum / count as f64).round(),
            min,
            max,
            count,
        })
    }
}

/// Y-axis bounds for a chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YDomain {
    pub min: f64,
    pub max: f64,
}

impl YDomain {
    /// Pad the range of every drawn value (solid and dashed) by ten units,
    /// never dropping below zero. Empty series get `fallback` padded the same way.
    pub fn from_points(points: &[ChartPoint], fallback: (f64, f64)) -> Self {
        let drawn = points
            .iter()
            .flat_map(|p| [p.value, p.dashed_value])
            .flatten();

        let (min, max) = drawn.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or(fallback);

        Self {
            min: (min - Y_PADDING).floor().max(0.0),
            max: (max + Y_PADDING).ceil(),
        }
    }
}

/// Qualitative reading of an average stress score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressBand {
    Relaxed,
    Balanced,
    Loaded,
}

impl StressBand {
    pub fn from_mean(mean: f64) -> Self {
        if mean < 30.0 {
            StressBand::Relaxed
        } else if mean < 60.0 {
            StressBand::Balanced
        } else {
            StressBand::Loaded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressBand::Relaxed => "relaxed",
            StressBand::Balanced => "balanced",
            StressBand::Loaded => "loaded",
        }
    }
}

/// X-axis tick settings for a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Number of ticks skipped between labels
    pub interval: u32,
    pub angle: i32,
    pub format: String,
}

impl AxisConfig {
    pub fn for_range(range: TimeRange) -> Self {
        let (interval, format) = match range {
            TimeRange::Day1 => (60, "HH:mm"),
            TimeRange::Days3 => (2, "MM/DD"),
            TimeRange::Days7 | TimeRange::Days10 => (1, "MM/DD"),
            TimeRange::Days30 => (5, "MM/DD"),
        };
        Self {
            interval,
            angle: 0,
            format: format.to_string(),
        }
    }
}
