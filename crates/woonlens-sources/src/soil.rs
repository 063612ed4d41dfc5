//! Soil map lookup for the address coordinates.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, Soil, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SoilResponse {
    code: Option<String>,
    name: Option<String>,
    groundwater: Option<String>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_soil(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Soil, SourceError> {
    let base = cfg.soil_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("soil base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("lat", &coordinates.latitude.to_string())
        .append_pair("lon", &coordinates.longitude.to_string());

    let response: SoilResponse = fetcher
        .get_json(deadline, "soil", url.as_str(), &[])
        .await?;

    Ok(Soil {
        soil_code: response.code,
        soil_name: response.name,
        groundwater_level: response.groundwater,
    })
}
