//! Resampling
//!
//! This module turns an irregular, sparse sample stream into a regular series:
//! - Future samples are dropped against an injected `now`
//! - Short windows with few samples pass through unbucketed
//! - Otherwise samples are averaged into fixed-width buckets and every bucket
//!   of the window is emitted, empty ones as `None`

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::config::ResampleConfig;
use crate::error::SeriesError;
use crate::types::{ResampledPoint, Sample, TimeRange};

/// Running sum of the valid values that fell into one bucket
#[derive(Debug, Default, Clone, Copy)]
struct BucketAccumulator {
    sum: f64,
    count: u32,
}

impl BucketAccumulator {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.sum / f64::from(self.count)).round())
    }
}

/// Resampler for converting raw samples to a regular series
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    config: ResampleConfig,
}

impl Resampler {
    pub fn new(config: ResampleConfig) -> Self {
        Self { config }
    }

    /// Create a resampler, rejecting bucket widths that are not positive
    pub fn try_new(config: ResampleConfig) -> Result<Self, SeriesError> {
        let errors = config.validate();
        if errors.is_empty() {
            Ok(Self { config })
        } else {
            Err(SeriesError::ConfigValidation(errors))
        }
    }

    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// Resample `samples` over the window ending at `now`.
    ///
    /// Deterministic for a given `now`. Returns an empty series for empty input.
    pub fn resample(
        &self,
        samples: &[Sample],
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Vec<ResampledPoint> {
        if samples.is_empty() {
            return Vec::new();
        }

        let filtered: Vec<&Sample> = samples.iter().filter(|s| s.time <= now).collect();
        if filtered.len() < samples.len() {
            debug!(
                dropped = samples.len() - filtered.len(),
                "dropped samples dated after now"
            );
        }

        if self.config.is_passthrough(range, filtered.len()) {
            debug!(samples = filtered.len(), %range, "passing samples through unbucketed");
            return passthrough(&filtered);
        }

        let step = self.config.step_ms(range);
        if step <= 0 {
            warn!(step_ms = step, %range, "bucket width is not positive, passing samples through");
            return passthrough(&filtered);
        }
        self.bucketize(&filtered, range, step, now.timestamp_millis())
    }

    fn bucketize(
        &self,
        samples: &[&Sample],
        range: TimeRange,
        step: i64,
        now_ms: i64,
    ) -> Vec<ResampledPoint> {
        let start_ms = now_ms - range.duration_ms();
        let mut buckets: HashMap<i64, BucketAccumulator> = HashMap::new();
        let mut out_of_window = 0usize;

        for sample in samples {
            let time_ms = sample.time.timestamp_millis();
            if time_ms < start_ms {
                out_of_window += 1;
                continue;
            }
            let Some(value) = sample.valid_value() else {
                continue;
            };
            let acc = buckets.entry(bucket_start(time_ms, step)).or_default();
            acc.sum += value;
            acc.count += 1;
        }

        debug!(
            %range,
            step_ms = step,
            filled = buckets.len(),
            out_of_window,
            "bucketed samples"
        );

        let mut series = Vec::new();
        let mut t = bucket_start(start_ms, step);
        while t <= now_ms {
            let value = buckets.get(&t).and_then(BucketAccumulator::mean);
            trace!(bucket = t, ?value, "bucket");
            if let Some(time) = DateTime::from_timestamp_millis(t) {
                series.push(ResampledPoint { time, value });
            }
            t += step;
        }
        series
    }
}

/// Start of the bucket containing `time_ms`
fn bucket_start(time_ms: i64, step: i64) -> i64 {
    time_ms.div_euclid(step) * step
}

fn passthrough(samples: &[&Sample]) -> Vec<ResampledPoint> {
    let mut points: Vec<ResampledPoint> = samples
        .iter()
        .map(|s| ResampledPoint {
            time: s.time,
            value: s.valid_value(),
        })
        .collect();
    points.sort_by_key(|p| p.time);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DAY_MS, HOUR_MS};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap()
    }

    fn sample_at(minutes_before_now: i64, value: Option<f64>) -> Sample {
        Sample::new(now() - Duration::minutes(minutes_before_now), value)
    }

    fn expected_len(range: TimeRange, step: i64) -> usize {
        ((range.duration_ms() + step - 1) / step + 1) as usize
    }

    #[test]
    fn test_non_positive_step_never_buckets() {
        let samples = vec![sample_at(90, Some(72.0)), sample_at(30, Some(0.0))];
        for step in [0, -HOUR_MS] {
            let resampler = Resampler::new(ResampleConfig {
                short_step_ms: step,
                long_step_ms: step,
                ..Default::default()
            });
            let series = resampler.resample(&samples, TimeRange::Days3, now());
            assert_eq!(series.len(), 2);
            assert_eq!(series[0].value, Some(72.0));
            assert_eq!(series[1].value, None);
        }
    }

    #[test]
    fn test_try_new_validates() {
        let config = ResampleConfig {
            short_step_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            Resampler::try_new(config),
            Err(SeriesError::ConfigValidation(_))
        ));
        assert!(Resampler::try_new(ResampleConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let resampler = Resampler::default();
        for range in TimeRange::ALL {
            assert!(resampler.resample(&[], range, now()).is_empty());
        }
    }

    #[test]
    fn test_bucketed_length_and_order() {
        let resampler = Resampler::default();
        let samples = vec![sample_at(30, Some(70.0)), sample_at(3000, Some(80.0))];

        for range in [TimeRange::Days3, TimeRange::Days7, TimeRange::Days10, TimeRange::Days30] {
            let step = resampler.config().step_ms(range);
            let series = resampler.resample(&samples, range, now());
            assert_eq!(series.len(), expected_len(range, step), "range {range}");
            assert!(series.windows(2).all(|w| w[0].time < w[1].time));
            for pair in series.windows(2) {
                assert_eq!((pair[1].time - pair[0].time).num_milliseconds(), step);
            }
        }
    }

    #[test]
    fn test_bucket_ignores_invalid_values() {
        let resampler = Resampler::default();
        // 12:00-13:00 bucket holds all four samples
        let samples = vec![
            sample_at(25, Some(0.0)),
            sample_at(20, Some(-5.0)),
            sample_at(15, None),
            sample_at(10, Some(80.0)),
        ];
        let series = resampler.resample(&samples, TimeRange::Days3, now());
        let last = series.last().unwrap();
        assert_eq!(last.time, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        assert_eq!(last.value, Some(80.0));
    }

    #[test]
    fn test_bucket_mean_is_rounded() {
        let resampler = Resampler::default();
        let samples = vec![
            sample_at(25, Some(70.0)),
            sample_at(20, Some(71.0)),
        ];
        let series = resampler.resample(&samples, TimeRange::Days3, now());
        assert_eq!(series.last().unwrap().value, Some(71.0));
    }

    #[test]
    fn test_empty_bucket_is_none_not_zero() {
        let resampler = Resampler::default();
        let samples = vec![sample_at(10, Some(0.0)), sample_at(5, Some(-1.0))];
        let series = resampler.resample(&samples, TimeRange::Days7, now());
        assert!(!series.is_empty());
        assert!(series.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_future_samples_excluded() {
        let resampler = Resampler::default();
        let future = Sample::new(now() + Duration::hours(1), Some(99.0));
        let samples = vec![sample_at(10, Some(70.0)), future];

        let passthrough = resampler.resample(&samples, TimeRange::Day1, now());
        assert_eq!(passthrough.len(), 1);
        assert!(passthrough.iter().all(|p| p.time <= now()));

        let bucketed = resampler.resample(&samples, TimeRange::Days3, now());
        assert!(bucketed.iter().all(|p| p.time <= now()));
        assert!(bucketed.iter().all(|p| p.value != Some(99.0)));
    }

    #[test]
    fn test_sample_at_now_is_kept() {
        let resampler = Resampler::default();
        let series = resampler.resample(&[sample_at(0, Some(64.0))], TimeRange::Day1, now());
        assert_eq!(series, vec![ResampledPoint { time: now(), value: Some(64.0) }]);
    }

    #[test]
    fn test_passthrough_keeps_samples_and_sorts() {
        let resampler = Resampler::default();
        let samples = vec![
            sample_at(10, Some(72.0)),
            sample_at(50, Some(0.0)),
            sample_at(90, Some(68.0)),
        ];
        let series = resampler.resample(&samples, TimeRange::Day1, now());
        let values: Vec<_> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(68.0), None, Some(72.0)]);
    }

    #[test]
    fn test_one_day_switches_to_buckets_at_threshold() {
        let resampler = Resampler::default();
        let samples: Vec<Sample> = (0..500i32)
            .map(|i| sample_at(i64::from(i) * 2, Some(60.0 + f64::from(i % 10))))
            .collect();
        let series = resampler.resample(&samples, TimeRange::Day1, now());
        assert_eq!(series.len(), expected_len(TimeRange::Day1, HOUR_MS));

        let fewer = &samples[..499];
        assert_eq!(resampler.resample(fewer, TimeRange::Day1, now()).len(), 499);
    }

    #[test]
    fn test_samples_before_window_dropped() {
        let resampler = Resampler::default();
        let old = Sample::new(now() - Duration::milliseconds(3 * DAY_MS + HOUR_MS), Some(90.0));
        let series = resampler.resample(&[old], TimeRange::Days3, now());
        assert!(series.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_configurable_threshold() {
        let resampler = Resampler::new(ResampleConfig {
            passthrough_max_samples: 2,
            ..Default::default()
        });
        let samples = vec![sample_at(10, Some(70.0)), sample_at(20, Some(72.0))];
        let series = resampler.resample(&samples, TimeRange::Day1, now());
        assert_eq!(series.len(), expected_len(TimeRange::Day1, HOUR_MS));
    }
}
