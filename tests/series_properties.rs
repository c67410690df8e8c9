use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use pulse_series::{
    bridge_gaps, Config, Metric, ResampledPoint, Resampler, Sample, SeriesProcessor, TimeRange,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap()
}

fn three_sample_records() -> Vec<serde_json::Value> {
    vec![
        json!({"timestamp": "2024-03-10T12:00:00Z", "bpm": 70}),
        json!({"timestamp": "2024-03-10T13:30:00Z", "bpm": 0}),
        json!({"timestamp": "2024-03-10T14:30:00Z", "bpm": 75}),
    ]
}

fn processor_with_heart_rate_gap(max_gap_ms: i64) -> SeriesProcessor {
    let mut config = Config::default();
    config.gaps.heart_rate_max_gap_ms = max_gap_ms;
    SeriesProcessor::with_config(config).unwrap()
}

#[test]
fn three_samples_pass_through_and_bridge_at_exact_gap() {
    // minute 0 to minute 150
    let gap_ms = 150 * 60 * 1000;
    let series = processor_with_heart_rate_gap(gap_ms).process_records(
        Metric::HeartRate,
        &three_sample_records(),
        TimeRange::Day1,
        now(),
    );

    assert_eq!(series.points.len(), 3);
    assert_eq!(series.points[0].value, Some(70.0));
    assert_eq!(series.points[1].value, None);
    assert_eq!(series.points[2].value, Some(75.0));

    let bridged = series.points[1].dashed_value.unwrap();
    assert!((bridged - 73.0).abs() < 1e-9);
    assert!(series.points[1].interpolated);
}

#[test]
fn three_samples_break_one_millisecond_past_gap() {
    let gap_ms = 150 * 60 * 1000;
    let series = processor_with_heart_rate_gap(gap_ms - 1).process_records(
        Metric::HeartRate,
        &three_sample_records(),
        TimeRange::Day1,
        now(),
    );

    assert_eq!(series.points.len(), 3);
    assert_eq!(series.points[1].dashed_value, None);
    assert!(!series.points[1].interpolated);
}

#[test]
fn three_samples_default_heart_rate_gap_is_a_break() {
    let series = SeriesProcessor::new().process_records(
        Metric::HeartRate,
        &three_sample_records(),
        TimeRange::Day1,
        now(),
    );
    assert_eq!(series.points[1].dashed_value, None);
}

#[test]
fn bucketed_windows_cover_the_whole_range() {
    let resampler = Resampler::default();
    let samples = vec![Sample::new(now() - Duration::hours(5), Some(64.0))];

    for range in [TimeRange::Days3, TimeRange::Days7, TimeRange::Days10, TimeRange::Days30] {
        let step = resampler.config().step_ms(range);
        let points = resampler.resample(&samples, range, now());

        let expected = (range.duration_ms() + step - 1) / step + 1;
        assert_eq!(points.len() as i64, expected, "range {}", range);
        assert!(points.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(points.iter().filter(|p| p.is_genuine()).count(), 1);
    }
}

#[test]
fn future_samples_never_reach_the_chart() {
    let records = vec![
        json!({"date": "2024-03-10T16:00:00Z", "stress": 40}),
        json!({"date": "2024-03-10T19:00:00Z", "stress": 55}),
    ];
    let series = SeriesProcessor::new().process_records(
        Metric::Stress,
        &records,
        TimeRange::Day1,
        now(),
    );

    assert_eq!(series.points.len(), 1);
    assert!(series.points.iter().all(|p| p.time <= now()));
}

#[test]
fn skewed_clock_removes_everything() {
    let records = vec![json!({"date": "2024-03-11T08:00:00Z", "hrv": 48})];
    let series =
        SeriesProcessor::new().process_records(Metric::Hrv, &records, TimeRange::Days7, now());

    assert!(series.points.iter().all(|p| p.value.is_none()));
    assert_eq!(series.stats, None);
}

#[test]
fn bridged_points_mirror_genuine_values() {
    let base = now() - Duration::hours(6);
    let values = [Some(61.0), None, None, Some(67.0), None, Some(70.0), None];
    let points: Vec<ResampledPoint> = values
        .iter()
        .enumerate()
        .map(|(i, v)| ResampledPoint {
            time: base + Duration::minutes(30 * i as i64),
            value: *v,
        })
        .collect();

    let bridged = bridge_gaps(&points, 3_600_000);
    for (input, output) in points.iter().zip(&bridged) {
        assert_eq!(input.time, output.time);
        if let Some(v) = input.value {
            assert_eq!(output.dashed_value, Some(v));
        }
    }
    // 90 minutes between 61 and 67 exceeds the hour limit
    assert_eq!(bridged[1].dashed_value, None);
    assert_eq!(bridged[4].dashed_value, Some(68.5));
    assert_eq!(bridged[6].dashed_value, None);
}

#[test]
fn serialized_points_use_camel_case_and_iso_times() {
    let series = SeriesProcessor::new().process_records(
        Metric::HeartRate,
        &three_sample_records(),
        TimeRange::Day1,
        now(),
    );
    let json = serde_json::to_value(&series.points[0]).unwrap();

    assert_eq!(json["time"], "2024-03-10T12:00:00.000Z");
    assert_eq!(json["value"], 70.0);
    assert!(json.get("dashedValue").is_some());
    assert!(json.get("displayLabel").is_some());
}
