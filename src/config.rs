use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::geo;
use crate::handlers::sensor::{SensorOptions, SensorSource};
use crate::handlers::session::{SessionSettings, DEFAULT_PEER_STALE_UPDATES};
use crate::models::error::TrackerError;
use crate::models::position::Coordinate;

pub struct TrackerConfig {
    pub server_url: String,
    pub session: SessionSettings,
    pub sensor: SensorOptions,
    pub source: Option<SensorSource>,
    pub seed: Option<u64>,
}

impl TrackerConfig {
    pub fn init() -> Result<TrackerConfig, TrackerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<TrackerConfig, TrackerError>
        where F: Fn(&'static str) -> Option<String> {
        let server_url = lookup("TRACKER_SERVER_URL")
            .unwrap_or_else(|| "ws://localhost:3000/ws".to_string());

        let session = SessionSettings {
            arrival_threshold_km: parse_finite(&lookup, "TRACKER_ARRIVAL_THRESHOLD_KM")?
                .unwrap_or(geo::DEFAULT_ARRIVAL_THRESHOLD_KM),
            destination_radius_deg: parse_finite(&lookup, "TRACKER_DESTINATION_RADIUS_DEG")?
                .unwrap_or(geo::DEFAULT_DESTINATION_RADIUS_DEG),
            key_step_deg: parse_finite(&lookup, "TRACKER_KEY_STEP_DEG")?
                .unwrap_or(geo::DEFAULT_KEY_STEP_DEG),
            peer_stale_updates: parse_var(&lookup, "TRACKER_PEER_STALE_UPDATES")?
                .unwrap_or(DEFAULT_PEER_STALE_UPDATES),
        };

        let sensor = SensorOptions {
            timeout: parse_var::<u64, _>(&lookup, "TRACKER_SENSOR_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(SensorOptions::default().timeout),
            ..SensorOptions::default()
        };

        let interval_ms: u64 = parse_var(&lookup, "TRACKER_REPLAY_INTERVAL_MS")?.unwrap_or(1000);
        let start_lat = parse_finite(&lookup, "TRACKER_START_LAT")?;
        let start_lon = parse_finite(&lookup, "TRACKER_START_LON")?;
        let start = match (start_lat, start_lon) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            (None, None) => None,
            (Some(_), None) => return Err(missing("TRACKER_START_LON")),
            (None, Some(_)) => return Err(missing("TRACKER_START_LAT")),
        };
        let source = match lookup("TRACKER_SENSOR_REPLAY") {
            Some(path) => Some(SensorSource::Replay {
                path: PathBuf::from(path),
                interval: Duration::from_millis(interval_ms),
            }),
            None => start.map(SensorSource::Fixed),
        };

        Ok(TrackerConfig {
            server_url,
            session,
            sensor,
            source,
            seed: parse_var(&lookup, "TRACKER_SEED")?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, TrackerError>
    where T: FromStr, F: Fn(&'static str) -> Option<String> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value.trim().parse()
            .map(Some)
            .map_err(|_| TrackerError::Config { key, value }),
    }
}

/// Like [`parse_var`], but `inf` and `NaN` are rejected.
fn parse_finite<F>(lookup: &F, key: &'static str) -> Result<Option<f64>, TrackerError>
    where F: Fn(&'static str) -> Option<String> {
    match parse_var::<f64, F>(lookup, key)? {
        Some(value) if !value.is_finite() => Err(TrackerError::Config {
            key,
            value: lookup(key).unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}

fn missing(key: &'static str) -> TrackerError {
    TrackerError::Config { key, value: String::new() }
}
