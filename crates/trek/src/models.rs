use serde::Serialize;
use time::OffsetDateTime;

/// A single GPS sample: position, recorded elevation, and capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation in meters, as recorded by the device.
    pub elevation: f64,
    /// Capture time, second resolution or finer.
    pub timestamp: OffsetDateTime,
}

/// A recorded hike: chronologically ordered GPS samples.
///
/// Timestamps are expected to be non-decreasing; an out-of-order pair is not
/// rejected, its interval duration is clamped to zero instead.
#[derive(Debug, Clone)]
pub struct Track {
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point coordinates as (latitude, longitude) pairs, in track order.
    pub fn coords(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.latitude, p.longitude))
            .collect()
    }

    /// Device-recorded elevations, in track order.
    pub fn raw_elevations(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.elevation).collect()
    }
}

/// Kinematics for the step from one track point to the next.
///
/// Interval 0 (the first point) is all-zero by definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Interval {
    /// Geodesic distance from the previous point, in meters.
    pub distance_m: f64,
    /// Elapsed time since the previous point, in seconds. Never negative.
    pub duration_s: f64,
    /// Elevation change since the previous point, in meters.
    pub rise_m: f64,
    /// Speed over the interval, or 0 when the duration is zero.
    pub speed_mps: f64,
    /// Slope as percent rise over distance, or 0 when the distance is zero.
    pub grade_pct: f64,
}

/// Aggregated energy expenditure for a whole track.
#[derive(Debug, Clone, Serialize)]
pub struct EnergySummary {
    pub total_joules: f64,
    /// Food calories (kcal).
    pub total_calories: f64,
    pub watt_hours: f64,
    /// Energy per interval in joules, parallel to the interval series.
    pub per_interval_joules: Vec<f64>,
}
