use std::env;
use std::str::FromStr;

use bytes::Bytes;
use geo::{Distance as _, Haversine, geometry::Point};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use trek::{
    elevation::{ElevationEnhancer, EnhancementResult, GpxzClient},
    energy, gpx_import,
    models::TrackPoint,
    quota::QuotaState,
};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn geodesic_m(a: &TrackPoint, b: &TrackPoint) -> f64 {
    Haversine.distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let gpx_path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: trek <track.gpx>"))?;

    let mass_kg: f64 = env_or("HIKER_MASS_KG", 80.0);
    let batch_size: usize = env_or("GPXZ_BATCH_SIZE", 50);
    let daily_limit: u32 = env_or("GPXZ_REQUESTS_PER_DAY", 100);
    let per_second_limit: f64 = env_or("GPXZ_REQUESTS_PER_SECOND", 1.0);

    let bytes = Bytes::from(std::fs::read(&gpx_path)?);
    let track = gpx_import::parse_track(bytes)?;
    tracing::info!("parsed {} track points from {}", track.len(), gpx_path);

    let elevations = match env::var("GPXZ_API_KEY") {
        Ok(api_key) if !api_key.is_empty() => {
            let enhancer = ElevationEnhancer::new(GpxzClient::new(api_key));
            let mut quota = QuotaState::new(daily_limit, per_second_limit);
            match enhancer
                .enhance(&track.coords(), &mut quota, batch_size)
                .await
            {
                EnhancementResult::Success(corrected) => corrected,
                EnhancementResult::Unavailable(reason) => {
                    tracing::info!("elevation correction unavailable ({reason}), using original elevation data");
                    track.raw_elevations()
                }
            }
        }
        _ => {
            tracing::info!("GPXZ_API_KEY not set, using original elevation data");
            track.raw_elevations()
        }
    };

    let intervals = energy::derive_intervals(&track, &elevations, geodesic_m);
    let summary = energy::energy_summary(&intervals, mass_kg);

    println!("Total calories used: {:.2}", summary.total_calories);
    println!("Total Joules used: {:.2}", summary.total_joules);
    println!("Wh used: {:.2}", summary.watt_hours);

    Ok(())
}
