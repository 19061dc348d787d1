use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};

/// Coefficient-of-variation threshold below which consecutive deltas look
/// periodic.
const CV_THRESHOLD: f64 = 0.15;
/// Maximum mean interval (seconds) still considered a beacon cadence.
const MAX_MEAN_SECONDS: f64 = 600.0;
const PERIODICITY_POINTS: u8 = 40;

fn mean_and_cv(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let std = variance.sqrt();
    let cv = if mean > 0.0 { std / mean } else { 999.0 };
    (mean, cv)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Detect periodic beacon cadence, in order of precedence: an explicit
/// `periodic` flag, a list of `intervals` (seconds), or a sorted list of
/// `timestamps` from which consecutive deltas are derived.
///
/// Returns `(points, details)` where `points` is either 0 or
/// [`PERIODICITY_POINTS`].
#[must_use]
pub fn periodicity_score(payload: &Json) -> (u8, Json) {
    if payload.get("periodic").and_then(Json::as_bool) == Some(true) {
        return (PERIODICITY_POINTS, json!({"method": "flag", "periodic": true}));
    }

    if let Some(intervals) = payload.get("intervals").and_then(Json::as_array)
        && intervals.len() >= 4
    {
        let vals: Vec<f64> = intervals.iter().filter_map(Json::as_f64).collect();
        if vals.len() >= 4 {
            let (mean, cv) = mean_and_cv(&vals);
            let periodic = cv < CV_THRESHOLD && mean <= MAX_MEAN_SECONDS;
            let points = if periodic { PERIODICITY_POINTS } else { 0 };
            return (points, json!({"method": "intervals", "mean": mean, "cv": cv, "periodic": periodic}));
        }
    }

    if let Some(timestamps) = payload.get("timestamps").and_then(Json::as_array)
        && timestamps.len() >= 5
    {
        let mut dts: Vec<DateTime<Utc>> = timestamps
            .iter()
            .filter_map(Json::as_str)
            .filter_map(parse_timestamp)
            .collect();
        if dts.len() >= 5 {
            dts.sort();
            let deltas: Vec<f64> = dts
                .windows(2)
                .map(|w| (w[1] - w[0]).num_seconds() as f64)
                .collect();
            if deltas.len() >= 4 {
                let (mean, cv) = mean_and_cv(&deltas);
                let periodic = cv < CV_THRESHOLD && mean <= MAX_MEAN_SECONDS;
                let points = if periodic { PERIODICITY_POINTS } else { 0 };
                return (points, json!({"method": "timestamps", "mean": mean, "cv": cv, "periodic": periodic}));
            }
        }
    }

    (0, json!({"method": "none", "periodic": false}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flag_wins() {
        let (pts, details) = periodicity_score(&json!({"periodic": true, "intervals": [1,2,3,4]}));
        assert_eq!(pts, 40);
        assert_eq!(details["method"], "flag");
    }

    #[test]
    fn tight_intervals_under_mean_cap_are_periodic() {
        let (pts, _) = periodicity_score(&json!({"intervals": [60.0, 61.0, 59.0, 60.5]}));
        assert_eq!(pts, 40);
    }

    #[test]
    fn wide_intervals_are_not_periodic() {
        let (pts, _) = periodicity_score(&json!({"intervals": [10.0, 500.0, 30.0, 900.0]}));
        assert_eq!(pts, 0);
    }

    #[test]
    fn twelve_timestamps_sixty_seconds_apart_is_periodic() {
        let timestamps: Vec<String> = (0..12)
            .map(|i| format!("2024-01-01T00:{:02}:00Z", i))
            .collect();
        let (pts, details) = periodicity_score(&json!({"timestamps": timestamps}));
        assert_eq!(pts, 40);
        assert_eq!(details["method"], "timestamps");
    }

    #[test]
    fn no_signal_yields_zero() {
        let (pts, details) = periodicity_score(&json!({}));
        assert_eq!(pts, 0);
        assert_eq!(details["method"], "none");
    }
}
