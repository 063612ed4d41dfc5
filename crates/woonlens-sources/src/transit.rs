//! Public-transport stops near the address.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, SourceEndpoints, Transit};
use woonlens_fetch::{Fetcher, SourceError};

use crate::geo::haversine_m;

const NEARBY_RADIUS_M: f64 = 500.0;

#[derive(Debug, Deserialize)]
struct StopList {
    #[serde(default)]
    stops: Vec<Stop>,
}

#[derive(Debug, Deserialize)]
struct Stop {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    lines: Vec<String>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_transit(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Transit, SourceError> {
    let base = cfg.ovapi_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(&format!("{}/stops", base.trim_end_matches('/'))).map_err(|e| {
        SourceError::Decode {
            context: format!("transit base URL '{base}'"),
            reason: e.to_string(),
        }
    })?;
    url.query_pairs_mut()
        .append_pair("lat", &coordinates.latitude.to_string())
        .append_pair("lon", &coordinates.longitude.to_string());

    let list: StopList = fetcher
        .get_json(deadline, "transit", url.as_str(), &[])
        .await?;

    let mut stops: Vec<(String, f64, Vec<String>)> = list
        .stops
        .into_iter()
        .filter_map(|stop| {
            let (Some(lat), Some(lon)) = (stop.latitude, stop.longitude) else {
                return None;
            };
            let d = haversine_m(
                coordinates,
                Coordinates {
                    longitude: lon,
                    latitude: lat,
                },
            );
            Some((
                stop.name.unwrap_or_else(|| "onbekend".to_owned()),
                d,
                stop.lines,
            ))
        })
        .collect();
    stops.sort_by(|a, b| a.1.total_cmp(&b.1));

    let stops_within_500m =
        u32::try_from(stops.iter().filter(|s| s.1 <= NEARBY_RADIUS_M).count()).unwrap_or(u32::MAX);

    let nearest = stops.into_iter().next();
    Ok(Transit {
        nearest_stop: nearest.as_ref().map(|(name, _, _)| name.clone()),
        nearest_stop_distance_m: nearest.as_ref().map(|(_, d, _)| *d),
        lines: nearest.map(|(_, _, lines)| lines).unwrap_or_default(),
        stops_within_500m,
    })
}
