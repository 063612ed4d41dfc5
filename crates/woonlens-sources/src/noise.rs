//! Cumulative noise load (Lden) at the address.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, Noise, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

/// Above this total the location exceeds the preferred residential limit.
const LIMIT_DB: f64 = 55.0;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct NoiseResponse {
    road_db: Option<f64>,
    rail_db: Option<f64>,
    industry_db: Option<f64>,
    total_lden: Option<f64>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_noise(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Noise, SourceError> {
    let base = cfg.noise_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("noise base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("lat", &coordinates.latitude.to_string())
        .append_pair("lon", &coordinates.longitude.to_string());

    let response: NoiseResponse = fetcher
        .get_json(deadline, "noise", url.as_str(), &[])
        .await?;

    // The map service usually reports the combined Lden; fall back to the
    // loudest single component when it does not.
    let total = response.total_lden.or_else(|| {
        [response.road_db, response.rail_db, response.industry_db]
            .into_iter()
            .flatten()
            .reduce(f64::max)
    });

    Ok(Noise {
        road_db: response.road_db,
        rail_db: response.rail_db,
        industry_db: response.industry_db,
        total_db: total,
        category: total.map(|db| categorise(db).to_owned()),
        exceeds_limit: total.is_some_and(|db| db > LIMIT_DB),
    })
}

fn categorise(total_db: f64) -> &'static str {
    if total_db < 50.0 {
        "Quiet"
    } else if total_db < 55.0 {
        "Moderate"
    } else if total_db < 65.0 {
        "Loud"
    } else {
        "Very Loud"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_thresholds() {
        assert_eq!(categorise(42.0), "Quiet");
        assert_eq!(categorise(50.0), "Moderate");
        assert_eq!(categorise(55.0), "Loud");
        assert_eq!(categorise(64.9), "Loud");
        assert_eq!(categorise(65.0), "Very Loud");
    }

    #[test]
    fn limit_is_strictly_above_55() {
        assert!(!(55.0 > LIMIT_DB));
        assert!(55.1 > LIMIT_DB);
    }

    #[test]
    fn total_falls_back_to_loudest_component() {
        let response = NoiseResponse {
            road_db: Some(52.0),
            rail_db: Some(58.5),
            industry_db: None,
            total_lden: None,
        };
        let total = response.total_lden.or_else(|| {
            [response.road_db, response.rail_db, response.industry_db]
                .into_iter()
                .flatten()
                .reduce(f64::max)
        });
        assert_eq!(total, Some(58.5));
    }
}
