//! Locomotion energy model: per-interval kinematics and calorie totals.
//!
//! Walks the track pairwise, derives speed and grade for each interval, and
//! applies a nonlinear hiking cost model to produce total joules, food
//! calories, and watt-hours. Never fails for a well-formed track.

use crate::models::{EnergySummary, Interval, Track, TrackPoint};

/// Joules in one food calorie (kcal).
pub const JOULES_PER_CALORIE: f64 = 4184.0;
/// Joules in one watt-hour.
pub const JOULES_PER_WATT_HOUR: f64 = 3600.0;

/// Derives per-interval kinematics for a track.
///
/// `elevations` is the elevation source in use (corrected or raw) and must
/// be parallel to the track points; `distance` supplies the geodesic
/// distance in meters between consecutive points. The first interval is
/// all-zero, and an out-of-order timestamp pair clamps to zero duration.
pub fn derive_intervals<F>(track: &Track, elevations: &[f64], distance: F) -> Vec<Interval>
where
    F: Fn(&TrackPoint, &TrackPoint) -> f64,
{
    debug_assert_eq!(elevations.len(), track.len());

    let points = &track.points;
    let mut intervals = Vec::with_capacity(points.len());
    if points.is_empty() {
        return intervals;
    }
    intervals.push(Interval::default());

    for i in 1..points.len() {
        let prev = &points[i - 1];
        let curr = &points[i];

        let distance_m = distance(prev, curr);
        let duration_s = (curr.timestamp - prev.timestamp).as_seconds_f64().max(0.0);
        let rise_m = elevations[i] - elevations[i - 1];
        let speed_mps = if duration_s > 0.0 {
            distance_m / duration_s
        } else {
            0.0
        };
        let grade_pct = if distance_m > 0.0 {
            rise_m / distance_m * 100.0
        } else {
            0.0
        };

        intervals.push(Interval {
            distance_m,
            duration_s,
            rise_m,
            speed_mps,
            grade_pct,
        });
    }

    intervals
}

/// Metabolic cost rate in watts per kilogram for walking at `speed_mps`
/// (m/s) on a slope of `grade_pct` (percent rise over distance).
///
/// Collapses to the 1.44 standing baseline at zero speed. Downhill grades
/// are fine as-is: the only fractional exponents over a variable quantity
/// have positive bases (1.05 and 1.1).
pub fn expenditure_rate(speed_mps: f64, grade_pct: f64) -> f64 {
    let s = speed_mps;
    let g = grade_pct;

    1.44 + 1.94 * s.powf(0.43)
        + 0.24 * s.powi(4)
        + 0.34 * s * g * (1.0 - 1.05_f64.powf(1.0 - 1.1_f64.powf(g + 32.0)))
}

/// Aggregates per-interval energy into track totals.
///
/// Zero-duration intervals contribute zero joules regardless of their cost
/// rate.
pub fn energy_summary(intervals: &[Interval], mass_kg: f64) -> EnergySummary {
    let per_interval_joules: Vec<f64> = intervals
        .iter()
        .map(|iv| expenditure_rate(iv.speed_mps, iv.grade_pct) * mass_kg * iv.duration_s)
        .collect();
    let total_joules: f64 = per_interval_joules.iter().sum();

    EnergySummary {
        total_joules,
        total_calories: total_joules / JOULES_PER_CALORIE,
        watt_hours: total_joules / JOULES_PER_WATT_HOUR,
        per_interval_joules,
    }
}

/// Smoothed instantaneous power in watts, for charting consumers.
///
/// Centered moving average of the joule series over `window` intervals
/// (shrinking at the edges), divided by each interval's duration.
/// Zero-duration intervals report zero power.
pub fn power_series(intervals: &[Interval], joules: &[f64], window: usize) -> Vec<f64> {
    debug_assert_eq!(joules.len(), intervals.len());

    let half = window.max(1) / 2;
    intervals
        .iter()
        .enumerate()
        .map(|(i, iv)| {
            if iv.duration_s <= 0.0 {
                return 0.0;
            }
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(joules.len());
            let mean = joules[start..end].iter().sum::<f64>() / (end - start) as f64;
            mean / iv.duration_s
        })
        .collect()
}

/// Running total of interval distances in meters, for chart x-axes.
pub fn cumulative_distance(intervals: &[Interval]) -> Vec<f64> {
    let mut total = 0.0;
    intervals
        .iter()
        .map(|iv| {
            total += iv.distance_m;
            total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn point(elevation: f64, seconds: i64) -> TrackPoint {
        TrackPoint {
            latitude: 46.0,
            longitude: 7.5,
            elevation,
            timestamp: OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds),
        }
    }

    #[test]
    fn test_flat_terrain_reduction() {
        // With zero grade the slope term vanishes exactly.
        for s in [0.5f64, 1.4, 2.0] {
            let expected = 1.44 + 1.94 * s.powf(0.43) + 0.24 * s.powi(4);
            assert!((expenditure_rate(s, 0.0) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_standing_baseline() {
        assert!((expenditure_rate(0.0, 0.0) - 1.44).abs() < 1e-12);
        // Grade is irrelevant while stationary.
        assert!((expenditure_rate(0.0, 45.0) - 1.44).abs() < 1e-12);
        assert!((expenditure_rate(0.0, -30.0) - 1.44).abs() < 1e-12);
    }

    #[test]
    fn test_downhill_grade_is_finite() {
        let ee = expenditure_rate(1.4, -25.0);
        assert!(ee.is_finite());
        // Moderate descent costs less than the same speed on the flat.
        assert!(ee < expenditure_rate(1.4, 0.0));
    }

    #[test]
    fn test_uphill_costs_more() {
        assert!(expenditure_rate(1.4, 20.0) > expenditure_rate(1.4, 0.0));
    }

    #[test]
    fn test_first_interval_is_zero() {
        let track = Track {
            points: vec![point(100.0, 0), point(100.0, 10)],
        };
        let intervals = derive_intervals(&track, &track.raw_elevations(), |_, _| 14.0);

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0], Interval::default());
    }

    #[test]
    fn test_interval_kinematics() {
        let track = Track {
            points: vec![point(100.0, 0), point(110.0, 10)],
        };
        let intervals = derive_intervals(&track, &track.raw_elevations(), |_, _| 14.0);

        let iv = intervals[1];
        assert!((iv.speed_mps - 1.4).abs() < 1e-9);
        assert!((iv.rise_m - 10.0).abs() < 1e-9);
        assert!((iv.grade_pct - 10.0 / 14.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_guard() {
        // Same timestamp twice: speed clamps to zero, not a division error.
        let track = Track {
            points: vec![point(100.0, 0), point(120.0, 0)],
        };
        let intervals = derive_intervals(&track, &track.raw_elevations(), |_, _| 14.0);

        let iv = intervals[1];
        assert_eq!(iv.duration_s, 0.0);
        assert_eq!(iv.speed_mps, 0.0);

        let summary = energy_summary(&intervals, 80.0);
        assert_eq!(summary.per_interval_joules[1], 0.0);
    }

    #[test]
    fn test_out_of_order_timestamps_clamp() {
        let track = Track {
            points: vec![point(100.0, 10), point(100.0, 0)],
        };
        let intervals = derive_intervals(&track, &track.raw_elevations(), |_, _| 14.0);
        assert_eq!(intervals[1].duration_s, 0.0);
    }

    #[test]
    fn test_zero_distance_guard() {
        let track = Track {
            points: vec![point(100.0, 0), point(110.0, 10)],
        };
        let intervals = derive_intervals(&track, &track.raw_elevations(), |_, _| 0.0);
        assert_eq!(intervals[1].grade_pct, 0.0);
    }

    #[test]
    fn test_elevation_source_overrides_raw() {
        // Corrected elevations drive the rise, not the recorded ones.
        let track = Track {
            points: vec![point(100.0, 0), point(100.0, 10)],
        };
        let corrected = vec![100.0, 125.0];
        let intervals = derive_intervals(&track, &corrected, |_, _| 14.0);
        assert!((intervals[1].rise_m - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_conversions() {
        let intervals = vec![
            Interval::default(),
            Interval {
                distance_m: 14.0,
                duration_s: 10.0,
                rise_m: 0.0,
                speed_mps: 1.4,
                grade_pct: 0.0,
            },
        ];
        let summary = energy_summary(&intervals, 80.0);

        let expected = expenditure_rate(1.4, 0.0) * 80.0 * 10.0;
        assert!((summary.total_joules - expected).abs() < 1e-9);
        assert!((summary.total_calories - expected / JOULES_PER_CALORIE).abs() < 1e-12);
        assert!((summary.watt_hours - expected / JOULES_PER_WATT_HOUR).abs() < 1e-12);
        assert_eq!(summary.per_interval_joules.len(), 2);
    }

    #[test]
    fn test_power_series_window_one_is_identity() {
        let intervals = vec![
            Interval {
                duration_s: 10.0,
                ..Interval::default()
            },
            Interval {
                duration_s: 20.0,
                ..Interval::default()
            },
        ];
        let joules = vec![500.0, 1000.0];

        let power = power_series(&intervals, &joules, 1);
        assert!((power[0] - 50.0).abs() < 1e-9);
        assert!((power[1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_series_zero_duration_guard() {
        let intervals = vec![Interval::default()];
        let power = power_series(&intervals, &[100.0], 3);
        assert_eq!(power, vec![0.0]);
    }

    #[test]
    fn test_power_series_smooths_neighbors() {
        let intervals: Vec<Interval> = (0..3)
            .map(|_| Interval {
                duration_s: 10.0,
                ..Interval::default()
            })
            .collect();
        let joules = vec![100.0, 400.0, 100.0];

        let power = power_series(&intervals, &joules, 3);
        // Middle point averages all three neighbors: 200 J over 10 s.
        assert!((power[1] - 20.0).abs() < 1e-9);
        // Edges shrink the window to what exists.
        assert!((power[0] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_distance() {
        let intervals = vec![
            Interval::default(),
            Interval {
                distance_m: 14.0,
                ..Interval::default()
            },
            Interval {
                distance_m: 6.0,
                ..Interval::default()
            },
        ];
        assert_eq!(cumulative_distance(&intervals), vec![0.0, 14.0, 20.0]);
    }
}
