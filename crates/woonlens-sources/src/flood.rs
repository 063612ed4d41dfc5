//! Flood risk classified from terrain elevation relative to NAP.
//!
//! The thresholds are part of the source's public contract: below −2 m is
//! High, below +1 m is Medium, anything else Low.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, FloodInfo, FloodRisk, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ElevationResponse {
    elevation_m: Option<f64>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_flood_risk(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<FloodInfo, SourceError> {
    let base = cfg
        .elevation_url
        .as_deref()
        .ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("elevation base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("lat", &coordinates.latitude.to_string())
        .append_pair("lon", &coordinates.longitude.to_string());

    let response: ElevationResponse = fetcher
        .get_json(deadline, "flood_risk", url.as_str(), &[])
        .await?;

    Ok(FloodInfo {
        elevation_m: response.elevation_m,
        risk: response.elevation_m.map(classify),
    })
}

fn classify(elevation_m: f64) -> FloodRisk {
    if elevation_m < -2.0 {
        FloodRisk::High
    } else if elevation_m < 1.0 {
        FloodRisk::Medium
    } else {
        FloodRisk::Low
    }
}
