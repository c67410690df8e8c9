//! Metric adaptors
//!
//! Maps backend records for one signal onto the generic pipeline: picks the
//! timestamp and value fields, converts them into samples, then decorates the
//! bridged series with display labels for the chart layer.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::SeriesError;
use crate::gaps::bridge_gaps;
use crate::resampler::Resampler;
use crate::summary::{AxisConfig, MetricStats, StressBand, YDomain};
use crate::timestamp::{display_label, full_label, parse_timestamp};
use crate::types::{BridgedPoint, ChartPoint, Metric, Sample, TimeRange};

/// Trait for turning raw backend records into samples
pub trait SampleAdapter {
    /// Extract samples, dropping records without a parseable timestamp
    fn samples(&self, records: &[Value]) -> Vec<Sample>;

    /// Parse a JSON array payload and extract samples
    fn parse(&self, raw_json: &str) -> Result<Vec<Sample>, SeriesError> {
        let records = parse_records(raw_json)?;
        Ok(self.samples(&records))
    }
}

/// Field-name mapping for one metric
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub time_field: &'static str,
    pub value_field: &'static str,
    pub offset: FixedOffset,
}

impl FieldMapping {
    pub fn for_metric(metric: Metric, offset: FixedOffset) -> Self {
        Self {
            time_field: metric.time_field(),
            value_field: metric.value_field(),
            offset,
        }
    }
}

impl SampleAdapter for FieldMapping {
    fn samples(&self, records: &[Value]) -> Vec<Sample> {
        let samples: Vec<Sample> = records
            .iter()
            .filter_map(|record| {
                let time = record
                    .get(self.time_field)
                    .and_then(Value::as_str)
                    .and_then(|raw| parse_timestamp(raw, self.offset))?;
                let value = record.get(self.value_field).and_then(numeric_value);
                Some(Sample::new(time, value))
            })
            .collect();

        if samples.len() < records.len() {
            debug!(
                field = self.time_field,
                dropped = records.len() - samples.len(),
                "dropped records with unparseable timestamps"
            );
        }
        samples
    }
}

/// Parse a JSON payload that must be an array of records
pub fn parse_records(raw_json: &str) -> Result<Vec<Value>, SeriesError> {
    match serde_json::from_str(raw_json)? {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        Value::Object(_) => Err(SeriesError::NotAnArray("object")),
        Value::String(_) => Err(SeriesError::NotAnArray("string")),
        Value::Number(_) => Err(SeriesError::NotAnArray("number")),
        Value::Bool(_) => Err(SeriesError::NotAnArray("boolean")),
    }
}

/// Parse newline-delimited JSON, one record per non-empty line
pub fn parse_ndjson_records(ndjson: &str) -> Result<Vec<Value>, SeriesError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|e| {
            SeriesError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read a numeric value the way a loose numeric cast would: numbers and
/// numeric strings count, everything else is no reading.
pub(crate) fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Fully processed series for one metric, ready for the chart layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub metric: Metric,
    pub range: TimeRange,
    pub unit: String,
    pub points: Vec<ChartPoint>,
    pub stats: Option<MetricStats>,
    /// Set for stress series with at least one genuine point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_band: Option<StressBand>,
    pub y_domain: YDomain,
    pub x_axis: AxisConfig,
}

/// Adaptor running the pipeline for one metric
pub struct MetricAdapter<'a> {
    metric: Metric,
    config: &'a Config,
    resampler: &'a Resampler,
}

impl<'a> MetricAdapter<'a> {
    pub fn new(metric: Metric, config: &'a Config, resampler: &'a Resampler) -> Self {
        Self {
            metric,
            config,
            resampler,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn mapping(&self) -> FieldMapping {
        FieldMapping::for_metric(self.metric, self.config.display.offset())
    }

    /// Resample and bridge already-parsed samples
    pub fn bridge(
        &self,
        samples: &[Sample],
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Vec<BridgedPoint> {
        let resampled = self.resampler.resample(samples, range, now);
        bridge_gaps(&resampled, self.config.gaps.max_gap_ms(self.metric))
    }

    /// Attach display labels to bridged points
    pub fn decorate(&self, bridged: &[BridgedPoint], range: TimeRange) -> Vec<ChartPoint> {
        let offset = self.config.display.offset();
        bridged
            .iter()
            .map(|p| ChartPoint {
                time: p.time,
                value: p.value,
                dashed_value: p.dashed_value,
                interpolated: p.is_interpolated(),
                display_label: display_label(p.time, offset, range),
                full_label: full_label(p.time, offset),
            })
            .collect()
    }

    /// Run the full pipeline over raw JSON records
    pub fn process(&self, records: &[Value], range: TimeRange, now: DateTime<Utc>) -> MetricSeries {
        let samples = self.mapping().samples(records);
        self.process_samples(&samples, range, now)
    }

    /// Run the full pipeline over parsed samples
    pub fn process_samples(
        &self,
        samples: &[Sample],
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> MetricSeries {
        let bridged = self.bridge(samples, range, now);
        let points = self.decorate(&bridged, range);
        let stats = MetricStats::from_points(&points);

        debug!(
            metric = %self.metric,
            %range,
            points = points.len(),
            genuine = stats.as_ref().map_or(0, |s| s.count),
            interpolated = points.iter().filter(|p| p.interpolated).count(),
            "processed metric series"
        );

        MetricSeries {
            metric: self.metric,
            range,
            unit: self.metric.unit().to_string(),
            y_domain: YDomain::from_points(&points, self.metric.nominal_range()),
            x_axis: AxisConfig::for_range(range),
            stress_band: match self.metric {
                Metric::Stress => stats.as_ref().map(|s| StressBand::from_mean(s.mean)),
                _ => None,
            },
            stats,
            points,
        }
    }
}
