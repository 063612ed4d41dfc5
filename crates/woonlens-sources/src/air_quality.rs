//! Air quality around the address.
//!
//! Two sequential calls: the measuring-station list (nearest station is
//! picked client-side by haversine), then the latest measurements for that
//! station. The AQI mapping over PM2.5 follows the upstream's published
//! breakpoints and is monotonic non-decreasing.

use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{AirQuality, Coordinates, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

use crate::geo::haversine_m;

#[derive(Debug, Deserialize)]
struct StationList {
    #[serde(default)]
    data: Vec<Station>,
}

#[derive(Debug, Deserialize)]
struct Station {
    number: String,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MeasurementList {
    #[serde(default)]
    data: Vec<Measurement>,
}

#[derive(Debug, Deserialize)]
struct Measurement {
    formula: String,
    value: Option<f64>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; `NotFound` when no station carries
/// coordinates; otherwise the underlying fetch errors.
pub async fn fetch_air_quality(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<AirQuality, SourceError> {
    let base = cfg
        .luchtmeetnet_url
        .as_deref()
        .ok_or(SourceError::ConfigMissing)?
        .trim_end_matches('/')
        .to_owned();

    let stations_url = format!("{base}/stations?page=1&order_by=number");
    let stations: StationList = fetcher
        .get_json(deadline, "air_quality", &stations_url, &[])
        .await?;

    let nearest = stations
        .data
        .into_iter()
        .filter_map(|s| {
            let (Some(lat), Some(lon)) = (s.latitude, s.longitude) else {
                return None;
            };
            let here = Coordinates {
                longitude: lon,
                latitude: lat,
            };
            Some((s.number, s.location, haversine_m(coordinates, here)))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2));

    let Some((number, location, distance_m)) = nearest else {
        return Err(SourceError::NotFound { url: stations_url });
    };
    tracing::debug!(station = %number, distance_m, "nearest measuring station selected");

    let measurements_url = format!("{base}/measurements?station_number={number}");
    let measurements: MeasurementList = fetcher
        .get_json(deadline, "air_quality", &measurements_url, &[])
        .await?;

    let latest = |formula: &str| {
        measurements
            .data
            .iter()
            .find(|m| m.formula == formula)
            .and_then(|m| m.value)
    };

    let pm25 = latest("PM25");
    let (aqi, category) = match pm25 {
        Some(v) => {
            let (aqi, category) = aqi_from_pm25(v);
            (Some(aqi), Some(category.to_owned()))
        }
        None => (None, None),
    };

    Ok(AirQuality {
        station: location.or(Some(number)),
        station_distance_m: Some(distance_m),
        pm25,
        pm10: latest("PM10"),
        no2: latest("NO2"),
        aqi,
        category,
    })
}

/// PM2.5 (µg/m³) to AQI with its category label.
fn aqi_from_pm25(v: f64) -> (f64, &'static str) {
    if v <= 12.0 {
        (50.0 * v / 12.0, "Good")
    } else if v <= 35.4 {
        (51.0 + 49.0 * (v - 12.1) / (35.4 - 12.1), "Moderate")
    } else {
        (101.0, "Unhealthy for Sensitive Groups")
    }
}
