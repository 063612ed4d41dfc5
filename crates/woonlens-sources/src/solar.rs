//! Roof solar potential. Bearer-token API.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, Solar, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PotentialResponse {
    irradiation_kwh_m2: Option<f64>,
    roof_area_m2: Option<f64>,
    estimated_yield_kwh: Option<f64>,
}

/// # Errors
///
/// `ConfigMissing` without both a URL and a token; otherwise the underlying
/// fetch errors.
pub async fn fetch_solar(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Solar, SourceError> {
    let (Some(base), Some(token)) = (cfg.solar_url.as_deref(), cfg.solar_api_token.as_deref())
    else {
        return Err(SourceError::ConfigMissing);
    };

    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("solar base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("lat", &coordinates.latitude.to_string())
        .append_pair("lon", &coordinates.longitude.to_string());

    let bearer = format!("Bearer {token}");
    let response: PotentialResponse = fetcher
        .get_json(
            deadline,
            "solar",
            url.as_str(),
            &[("authorization", bearer.as_str())],
        )
        .await?;

    Ok(Solar {
        annual_irradiation_kwh_m2: response.irradiation_kwh_m2,
        suitable_roof_area_m2: response.roof_area_m2,
        estimated_yield_kwh: response.estimated_yield_kwh,
    })
}
