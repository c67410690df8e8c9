//! Pipeline orchestration
//!
//! This module provides the public API for Pulse Series.
//! It runs raw backend JSON through resampling, gap bridging and decoration,
//! producing chart-ready series and period summaries.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::Config;
use crate::daily::{ActivityRecord, PeriodSummary, SleepRecord, TargetInfo};
use crate::error::SeriesError;
use crate::metrics::{parse_records, MetricAdapter, MetricSeries};
use crate::resampler::Resampler;
use crate::types::{Metric, Sample, TimeRange};

/// Convert a raw heart-rate JSON array into a chart-ready series.
///
/// # Arguments
/// * `raw_json` - JSON array of `{ "timestamp": ..., "bpm": ... }` records
/// * `range` - Dashboard window
/// * `now` - End of the window
///
/// # Example
/// ```ignore
/// let series = heart_rate_series(&json, TimeRange::Day1, Utc::now())?;
/// ```
pub fn heart_rate_series(
    raw_json: &str,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<MetricSeries, SeriesError> {
    metric_series(Metric::HeartRate, raw_json, range, now)
}

/// Convert a raw JSON array for any metric into a chart-ready series,
/// using the default configuration.
pub fn metric_series(
    metric: Metric,
    raw_json: &str,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<MetricSeries, SeriesError> {
    SeriesProcessor::new().process_json(metric, raw_json, range, now)
}

/// Processor holding a validated configuration.
///
/// Holds no data between calls; every call rebuilds its series from the
/// records it is given.
#[derive(Debug, Clone, Default)]
pub struct SeriesProcessor {
    config: Config,
    resampler: Resampler,
}

impl SeriesProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor from a configuration, validating it first
    pub fn with_config(config: Config) -> Result<Self, SeriesError> {
        config.validate()?;
        Ok(Self {
            resampler: Resampler::try_new(config.resample.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adaptor for one metric bound to this processor's configuration
    pub fn adapter(&self, metric: Metric) -> MetricAdapter<'_> {
        MetricAdapter::new(metric, &self.config, &self.resampler)
    }

    /// Process a JSON array payload for `metric`
    pub fn process_json(
        &self,
        metric: Metric,
        raw_json: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<MetricSeries, SeriesError> {
        let records = parse_records(raw_json)?;
        Ok(self.process_records(metric, &records, range, now))
    }

    /// Process already-decoded JSON records for `metric`
    pub fn process_records(
        &self,
        metric: Metric,
        records: &[Value],
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> MetricSeries {
        self.adapter(metric).process(records, range, now)
    }

    /// Process parsed samples for `metric`
    pub fn process_samples(
        &self,
        metric: Metric,
        samples: &[Sample],
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> MetricSeries {
        self.adapter(metric).process_samples(samples, range, now)
    }

    /// Process every metric payload present in `payloads`
    pub fn process_all<'p, I>(
        &self,
        payloads: I,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<Vec<MetricSeries>, SeriesError>
    where
        I: IntoIterator<Item = (Metric, &'p str)>,
    {
        payloads
            .into_iter()
            .map(|(metric, raw_json)| self.process_json(metric, raw_json, range, now))
            .collect()
    }

    /// Build the headline summary from raw activity, sleep and heart-rate JSON
    pub fn summarize(
        &self,
        activity_json: &str,
        sleep_json: &str,
        heart_rate_json: &str,
        targets: &TargetInfo,
        range: TimeRange,
    ) -> Result<PeriodSummary, SeriesError> {
        let activity: Vec<ActivityRecord> = decode_array(activity_json)?;
        let sleep: Vec<SleepRecord> = decode_array(sleep_json)?;
        let heart_rate = parse_records(heart_rate_json)?;
        Ok(PeriodSummary::build(&activity, &sleep, &heart_rate, targets, range))
    }
}

fn decode_array<T: serde::de::DeserializeOwned>(raw_json: &str) -> Result<Vec<T>, SeriesError> {
    let records = parse_records(raw_json)?;
    Ok(serde_json::from_value(Value::Array(records))?)
}
