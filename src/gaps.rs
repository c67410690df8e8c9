//! Gap bridging
//!
//! Marks genuine points and fills short holes with a linear estimate so the
//! chart can draw a dashed segment across them. Holes wider than the allowed
//! gap, and holes open on one side, stay `None` and render as a true break.

use crate::types::{BridgedPoint, ResampledPoint};

/// Bridge short gaps in a time-ordered series.
///
/// Uses one backward and one forward pass to find the nearest genuine
/// neighbours of every point, so the cost is linear in the series length.
pub fn bridge_gaps(points: &[ResampledPoint], max_gap_ms: i64) -> Vec<BridgedPoint> {
    let mut bridged: Vec<BridgedPoint> = points
        .iter()
        .map(|p| BridgedPoint {
            time: p.time,
            value: p.value,
            dashed_value: p.value,
        })
        .collect();

    if points.len() < 2 {
        return bridged;
    }

    let next_genuine = nearest_genuine_after(points);
    let mut prev_genuine: Option<usize> = None;

    for (i, point) in points.iter().enumerate() {
        if point.is_genuine() {
            prev_genuine = Some(i);
            continue;
        }
        if let (Some(p), Some(q)) = (prev_genuine, next_genuine[i]) {
            bridged[i].dashed_value = interpolate(points, p, q, i, max_gap_ms);
        }
    }

    bridged
}

/// For every index, the nearest later index holding a genuine value
fn nearest_genuine_after(points: &[ResampledPoint]) -> Vec<Option<usize>> {
    let mut next = vec![None; points.len()];
    let mut upcoming = None;
    for i in (0..points.len()).rev() {
        next[i] = upcoming;
        if points[i].is_genuine() {
            upcoming = Some(i);
        }
    }
    next
}

fn interpolate(
    points: &[ResampledPoint],
    p: usize,
    q: usize,
    i: usize,
    max_gap_ms: i64,
) -> Option<f64> {
    let (v0, v1) = (points[p].value?, points[q].value?);
    debug_assert!(!points[p + 1..q].iter().any(ResampledPoint::is_genuine));

    let t0 = points[p].time.timestamp_millis();
    let dt = points[q].time.timestamp_millis() - t0;
    if dt <= 0 || dt > max_gap_ms {
        return None;
    }

    let ratio = (points[i].time.timestamp_millis() - t0) as f64 / dt as f64;
    Some(v0 + (v1 - v0) * ratio)
}
