//! Period summaries for activity and sleep
//!
//! Backends report calories in small calories, distance in meters, active time
//! in seconds and sleep stages in minutes. All conversions happen here so no
//! caller converts twice.

use chrono::{Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::metrics::numeric_value;
use crate::timestamp::parse_timestamp;
use crate::types::{Metric, TimeRange};

/// Default per-day distance goal (meters) when the target is missing
pub const DEFAULT_DISTANCE_TARGET_M: f64 = 8000.0;

/// Resting heart rate reported when no valid heart-rate record exists
pub const DEFAULT_RESTING_HR_BPM: f64 = 50.0;

const CALORIES_PER_KCAL: f64 = 1000.0;
const METERS_PER_KM: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

const REALTIME_HEART_RATE_TYPE: &str = "realtime_heartrate";
const REALTIME_TIME_FIELDS: [&str; 2] = ["timestamp", "received_at"];
const REALTIME_VALUE_FIELDS: [&str; 4] = ["heartRate", "heartrate", "bpm", "hr"];

/// One day of activity as sent by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityRecord {
    pub day: Option<String>,
    pub total_step_count: Option<f64>,
    pub run_step_count: Option<f64>,
    /// Small calories
    pub calories: Option<f64>,
    /// Meters
    pub distance: Option<f64>,
    /// Seconds
    pub active_time: Option<f64>,
}

/// One night of sleep as sent by the backend, durations in minutes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepRecord {
    pub day: Option<String>,
    pub duration: Option<f64>,
    pub deep: Option<f64>,
    pub light: Option<f64>,
    pub rem: Option<f64>,
    pub awake: Option<f64>,
    pub bedtime_start: Option<String>,
    pub bedtime_end: Option<String>,
}

/// Per-day goals configured by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetInfo {
    pub step_target: f64,
    /// Kilocalories
    pub calorie_target: f64,
    /// Meters, `None` or zero falls back to the default
    pub distance_target: Option<f64>,
}

/// Activity totals over the selected window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub total_steps: f64,
    pub total_kcal: f64,
    pub total_km: f64,
    pub active_minutes: f64,
}

impl ActivitySummary {
    pub fn from_records(records: &[ActivityRecord]) -> Self {
        let sum = |field: fn(&ActivityRecord) -> Option<f64>| -> f64 {
            records.iter().filter_map(field).sum()
        };

        Self {
            total_steps: sum(|r| r.total_step_count),
            total_kcal: sum(|r| r.calories) / CALORIES_PER_KCAL,
            total_km: sum(|r| r.distance) / METERS_PER_KM,
            active_minutes: (sum(|r| r.active_time) / SECONDS_PER_MINUTE).round(),
        }
    }

    /// Progress against per-day targets scaled to the window length
    pub fn goals(&self, targets: &TargetInfo, range: TimeRange) -> Vec<GoalProgress> {
        let days = f64::from(range.days().max(1));
        let distance_target_m = targets
            .distance_target
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_DISTANCE_TARGET_M);

        vec![
            GoalProgress::new(GoalKind::Steps, self.total_steps, targets.step_target * days),
            GoalProgress::new(
                GoalKind::Distance,
                self.total_km,
                distance_target_m * days / METERS_PER_KM,
            ),
            GoalProgress::new(GoalKind::Calories, self.total_kcal, targets.calorie_target * days),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Steps,
    Distance,
    Calories,
}

impl GoalKind {
    pub fn unit(&self) -> &'static str {
        match self {
            GoalKind::Steps => "steps",
            GoalKind::Distance => "km",
            GoalKind::Calories => "kcal",
        }
    }
}

/// Progress toward one goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub kind: GoalKind,
    pub value: f64,
    pub target: f64,
    /// `value / target`, zero when the target is unset
    pub progress: f64,
}

impl GoalProgress {
    fn new(kind: GoalKind, value: f64, target: f64) -> Self {
        let progress = if target > 0.0 { value / target } else { 0.0 };
        Self {
            kind,
            value,
            target,
            progress,
        }
    }
}

/// Share of one sleep stage in the average night
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageShare {
    pub stage: SleepStage,
    pub minutes: f64,
    /// Percentage of total sleep duration
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Deep,
    Light,
    Rem,
    Awake,
}

/// Average night over the selected window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub nights: usize,
    pub average_minutes: f64,
    pub hours: u32,
    pub minutes: u32,
    pub stages: Vec<StageShare>,
    /// Percentage of the night not spent awake
    pub efficiency: f64,
    /// Heuristic 0-100 score derived from efficiency
    pub score: f64,
}

impl SleepSummary {
    /// Returns `None` when there is no sleep record
    pub fn from_records(records: &[SleepRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let nights = records.len();
        let average = |field: fn(&SleepRecord) -> Option<f64>| -> f64 {
            records.iter().filter_map(field).sum::<f64>() / nights as f64
        };

        let total = average(|r| r.duration);
        let awake = average(|r| r.awake);
        let denominator = if total > 0.0 { total } else { 1.0 };

        let stages = [
            (SleepStage::Deep, average(|r| r.deep)),
            (SleepStage::Light, average(|r| r.light)),
            (SleepStage::Rem, average(|r| r.rem)),
            (SleepStage::Awake, awake),
        ]
        .into_iter()
        .map(|(stage, minutes)| StageShare {
            stage,
            minutes,
            percent: minutes / denominator * 100.0,
        })
        .collect();

        let efficiency = ((total - awake) / denominator * 100.0).round();
        let score = (efficiency * 0.7 + 25.0).round().min(100.0);
        let rounded_minutes = total.round().max(0.0) as u32;

        Some(Self {
            nights,
            average_minutes: total,
            hours: rounded_minutes / 60,
            minutes: rounded_minutes % 60,
            stages,
            efficiency,
            score,
        })
    }
}

/// Lowest positive heart-rate value among raw records
pub fn resting_heart_rate(records: &[Value]) -> f64 {
    let field = Metric::HeartRate.value_field();
    records
        .iter()
        .filter_map(|r| r.get(field).and_then(numeric_value))
        .filter(|bpm| *bpm > 0.0)
        .fold(None, |acc: Option<f64>, bpm| Some(acc.map_or(bpm, |m| m.min(bpm))))
        .map(f64::round)
        .unwrap_or(DEFAULT_RESTING_HR_BPM)
}

/// Latest value among realtime heart-rate measurements.
///
/// Only records typed `realtime_heartrate` count. The newest is chosen by
/// `timestamp`, or `received_at` when that is missing; records with neither
/// sort as oldest. The value is the first positive reading among
/// `heartRate`, `heartrate`, `bpm` and `hr`.
pub fn latest_realtime_heart_rate(records: &[Value]) -> Option<f64> {
    let instant = |record: &Value| {
        REALTIME_TIME_FIELDS
            .iter()
            .find_map(|field| record.get(*field).and_then(Value::as_str))
            .and_then(|raw| parse_timestamp(raw, Utc.fix()))
            .map_or(i64::MIN, |t| t.timestamp_millis())
    };

    let latest = records
        .iter()
        .filter(|r| r.get("type").and_then(Value::as_str) == Some(REALTIME_HEART_RATE_TYPE))
        .fold(None, |best: Option<(&Value, i64)>, record| {
            let t = instant(record);
            match best {
                Some((_, best_t)) if best_t >= t => best,
                _ => Some((record, t)),
            }
        })
        .map(|(record, _)| record)?;

    let value = REALTIME_VALUE_FIELDS
        .iter()
        .filter_map(|field| latest.get(*field).and_then(numeric_value))
        .find(|bpm| *bpm > 0.0);
    if value.is_none() {
        debug!(record = %latest, "realtime heart-rate record carries no value");
    }
    value
}

/// Headline numbers shown above the charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub range: TimeRange,
    pub activity: ActivitySummary,
    pub goals: Vec<GoalProgress>,
    pub sleep: Option<SleepSummary>,
    pub resting_heart_rate: f64,
}

impl PeriodSummary {
    pub fn build(
        activity: &[ActivityRecord],
        sleep: &[SleepRecord],
        heart_rate: &[Value],
        targets: &TargetInfo,
        range: TimeRange,
    ) -> Self {
        let activity = ActivitySummary::from_records(activity);
        Self {
            range,
            goals: activity.goals(targets, range),
            activity,
            sleep: SleepSummary::from_records(sleep),
            resting_heart_rate: resting_heart_rate(heart_rate),
        }
    }
}
