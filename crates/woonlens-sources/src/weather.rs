//! Recent weather normals for the address coordinates.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, SourceEndpoints, Weather};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailySeries>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DailySeries {
    temperature_2m_mean: Vec<Option<f64>>,
    /// Seconds of sunshine per day.
    sunshine_duration: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

/// Fetches the daily series for the past week and averages it.
///
/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_weather(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Weather, SourceError> {
    let base = cfg.open_meteo_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("weather base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("latitude", &coordinates.latitude.to_string())
        .append_pair("longitude", &coordinates.longitude.to_string())
        .append_pair(
            "daily",
            "temperature_2m_mean,sunshine_duration,precipitation_sum,wind_speed_10m_max",
        )
        .append_pair("past_days", "7")
        .append_pair("forecast_days", "1")
        .append_pair("timezone", "UTC");

    let response: ForecastResponse = fetcher
        .get_json(deadline, "weather", url.as_str(), &[])
        .await?;

    let daily = response.daily.unwrap_or_default();
    Ok(Weather {
        avg_temperature_c: mean(&daily.temperature_2m_mean),
        sunshine_hours: mean(&daily.sunshine_duration).map(seconds_to_hours),
        precipitation_mm: mean(&daily.precipitation_sum),
        wind_speed_ms: mean(&daily.wind_speed_10m_max),
    })
}

fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().copied().flatten().collect();
    if present.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// The provider reports sunshine in seconds; the composite carries hours.
fn seconds_to_hours(seconds: f64) -> f64 {
    seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunshine_seconds_convert_to_hours() {
        assert!((seconds_to_hours(7200.0) - 2.0).abs() < 1e-9);
        assert!((seconds_to_hours(0.0)).abs() < 1e-9);
    }

    #[test]
    fn mean_skips_null_entries() {
        let values = vec![Some(10.0), None, Some(20.0)];
        assert_eq!(mean(&values), Some(15.0));
    }

    #[test]
    fn mean_of_all_nulls_is_absent() {
        let values: Vec<Option<f64>> = vec![None, None];
        assert_eq!(mean(&values), None);
        assert_eq!(mean(&[]), None);
    }
}
