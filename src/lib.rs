//! Pulse Series - Gap-aware time-series normalization for wearable dashboards
//!
//! Pulse Series turns irregular, sparse wearable samples into regular series a
//! chart can draw through a deterministic pipeline: metric adaptation →
//! resampling → gap bridging → label decoration → summary statistics.
//!
//! ## Modules
//!
//! - **Resampler**: window filtering, pass-through or fixed-width bucket averaging
//! - **Gap Bridger**: linear interpolation across short holes, real vs. inferred
//! - **Metric Adaptors**: heart rate, HRV, stress and blood oxygen field mapping
//! - **Daily Summaries**: activity totals, goal progress and average sleep

pub mod config;
pub mod daily;
pub mod error;
pub mod gaps;
pub mod metrics;
pub mod pipeline;
pub mod refresh;
pub mod resampler;
pub mod summary;
pub mod timestamp;
pub mod types;

pub use config::Config;
pub use error::SeriesError;
pub use gaps::bridge_gaps;
pub use metrics::{MetricAdapter, MetricSeries, SampleAdapter};
pub use pipeline::{heart_rate_series, metric_series, SeriesProcessor};
pub use resampler::Resampler;
pub use types::{BridgedPoint, ChartPoint, Metric, ResampledPoint, Sample, TimeRange};

/// Crate version embedded in CLI reports
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI reports
pub const PRODUCER_NAME: &str = "pulse-series";
