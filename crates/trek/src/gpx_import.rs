//! GPX track import.
//!
//! Flattens every track and segment in the file into one chronological point
//! sequence, in file order. Points must carry both a timestamp and an
//! elevation; tracks without them are rejected before any energy
//! computation runs.

use bytes::{Buf as _, Bytes};
use thiserror::Error;
use time::OffsetDateTime;

use crate::models::{Track, TrackPoint};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to parse GPX: {0}")]
    Parse(String),
    #[error("no track points found")]
    Empty,
    #[error("track point {index} has no timestamp")]
    MissingTimestamp { index: usize },
    #[error("track point {index} has no elevation")]
    MissingElevation { index: usize },
}

/// Parses GPX bytes into a [`Track`].
pub fn parse_track(bytes: Bytes) -> Result<Track, TrackError> {
    let gpx = gpx::read(bytes.reader()).map_err(|e| TrackError::Parse(e.to_string()))?;

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let index = points.len();
                let timestamp: OffsetDateTime = waypoint
                    .time
                    .ok_or(TrackError::MissingTimestamp { index })?
                    .into();
                let elevation = waypoint
                    .elevation
                    .ok_or(TrackError::MissingElevation { index })?;

                points.push(TrackPoint {
                    latitude: waypoint.point().y(),
                    longitude: waypoint.point().x(),
                    elevation,
                    timestamp,
                });
            }
        }
    }

    if points.is_empty() {
        return Err(TrackError::Empty);
    }

    Ok(Track { points })
}
