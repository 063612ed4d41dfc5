//! Neighbourhood statistics from the statistics office's OData feed.
//!
//! The upstream reports money in thousands of euros and low income as a
//! percentage of households; both are multiplied out here so the composite
//! carries plain units. Negative values are the office's "no data" sentinels
//! and decode to absent.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Demographics, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize)]
struct ODataEnvelope {
    #[serde(default)]
    value: Vec<NeighbourhoodRow>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct NeighbourhoodRow {
    #[serde(rename = "AantalInwoners_5")]
    population: Option<f64>,
    #[serde(rename = "HuishoudensTotaal_28")]
    households: Option<f64>,
    #[serde(rename = "Bevolkingsdichtheid_33")]
    density: Option<f64>,
    /// Thousands of euros per inhabitant.
    #[serde(rename = "GemiddeldInkomenPerInwoner_66")]
    avg_income_thousands: Option<f64>,
    /// Thousands of euros.
    #[serde(rename = "GemiddeldeWOZWaardeVanWoningen_35")]
    avg_woz_thousands: Option<f64>,
    /// Percentage of households.
    #[serde(rename = "HuishoudensMetEenLaagInkomen_70")]
    low_income_pct: Option<f64>,
    #[serde(rename = "Koopwoningen_40")]
    owner_occupied_pct: Option<f64>,
}

/// Fetches the statistics row for one neighbourhood code.
///
/// # Errors
///
/// `ConfigMissing` without a URL; `NotFound` when the feed has no row for the
/// code; otherwise the underlying fetch errors.
pub async fn fetch_demographics(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    neighbourhood_code: &str,
) -> Result<Demographics, SourceError> {
    let base = cfg.cbs_odata_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    let url = build_url(base, neighbourhood_code)?;

    let envelope: ODataEnvelope = fetcher
        .get_json(deadline, "demographics", url.as_str(), &[])
        .await?;

    let Some(row) = envelope.value.into_iter().next() else {
        return Err(SourceError::NotFound {
            url: url.to_string(),
        });
    };

    Ok(reshape(row))
}

fn build_url(base: &str, code: &str) -> Result<Url, SourceError> {
    let mut url = Url::parse(&format!("{}/TypedDataSet", base.trim_end_matches('/'))).map_err(
        |e| SourceError::Decode {
            context: format!("demographics base URL '{base}'"),
            reason: e.to_string(),
        },
    )?;
    url.query_pairs_mut()
        .append_pair("$filter", &format!("WijkenEnBuurten eq '{code}'"))
        .append_pair("$top", "1");
    Ok(url)
}

/// Negative values are sentinels for "not published".
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v >= 0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn reshape(row: NeighbourhoodRow) -> Demographics {
    let population = present(row.population).map(|v| v as i64);
    let households = present(row.households).map(|v| v as i64);
    let low_income_households = present(row.low_income_pct).and_then(|pct| {
        households.map(|total| ((pct / 100.0) * total as f64).round() as i64)
    });

    Demographics {
        population,
        households,
        avg_income: present(row.avg_income_thousands).map(|v| v * 1000.0),
        population_density: present(row.density).map(|v| v as i64),
        avg_woz_value: present(row.avg_woz_thousands).map(|v| v * 1000.0),
        low_income_households,
        owner_occupied_pct: present(row.owner_occupied_pct),
    }
}
