//! Listed monuments near the address, from the national heritage register.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, Monuments, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

use crate::geo::haversine_m;

const SEARCH_RADIUS_M: f64 = 500.0;

/// Within this distance the address itself counts as the listed object.
const SAME_OBJECT_M: f64 = 25.0;

#[derive(Debug, Deserialize)]
struct MonumentList {
    #[serde(default)]
    monumenten: Vec<Monument>,
}

#[derive(Debug, Deserialize)]
struct Monument {
    naam: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_monuments(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Monuments, SourceError> {
    let base = cfg
        .monuments_url
        .as_deref()
        .ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("monuments base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("lat", &coordinates.latitude.to_string())
        .append_pair("lon", &coordinates.longitude.to_string())
        .append_pair("radius", &format!("{SEARCH_RADIUS_M}"));

    let list: MonumentList = fetcher
        .get_json(deadline, "monuments", url.as_str(), &[])
        .await?;

    let mut within: Vec<(String, f64)> = list
        .monumenten
        .into_iter()
        .filter_map(|m| {
            let (Some(lat), Some(lon)) = (m.latitude, m.longitude) else {
                return None;
            };
            let d = haversine_m(
                coordinates,
                Coordinates {
                    longitude: lon,
                    latitude: lat,
                },
            );
            (d <= SEARCH_RADIUS_M).then(|| (m.naam.unwrap_or_else(|| "onbekend".to_owned()), d))
        })
        .collect();
    within.sort_by(|a, b| a.1.total_cmp(&b.1));

    let nearest = within.first().cloned();
    Ok(Monuments {
        count_within_500m: u32::try_from(within.len()).unwrap_or(u32::MAX),
        is_listed_building: nearest.as_ref().is_some_and(|(_, d)| *d <= SAME_OBJECT_M),
        nearest_name: nearest.as_ref().map(|(name, _)| name.clone()),
        nearest_distance_m: nearest.map(|(_, d)| d),
    })
}
