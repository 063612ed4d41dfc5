//! Neighbourhood safety perception, keyed by region code.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Safety, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize)]
struct ODataEnvelope {
    #[serde(default)]
    value: Vec<SafetyRow>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SafetyRow {
    #[serde(rename = "Veiligheidsbeleving_1")]
    perception_score: Option<f64>,
    #[serde(rename = "GeregistreerdeMisdrijvenPer1000Inwoners_2")]
    crimes_per_1000: Option<f64>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; `NotFound` when no row exists for the
/// code; otherwise the underlying fetch errors.
pub async fn fetch_safety(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    neighbourhood_code: &str,
) -> Result<Safety, SourceError> {
    let base = cfg.safety_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    let mut url = Url::parse(&format!("{}/TypedDataSet", base.trim_end_matches('/'))).map_err(
        |e| SourceError::Decode {
            context: format!("safety base URL '{base}'"),
            reason: e.to_string(),
        },
    )?;
    url.query_pairs_mut()
        .append_pair(
            "$filter",
            &format!("WijkenEnBuurten eq '{neighbourhood_code}'"),
        )
        .append_pair("$top", "1");

    let envelope: ODataEnvelope = fetcher
        .get_json(deadline, "safety", url.as_str(), &[])
        .await?;

    let Some(row) = envelope.value.into_iter().next() else {
        return Err(SourceError::NotFound {
            url: url.to_string(),
        });
    };

    let perception_score = row.perception_score.filter(|v| *v >= 0.0);
    Ok(Safety {
        perception_score,
        label: perception_score.map(|score| label(score).to_owned()),
        crimes_per_1000: row.crimes_per_1000.filter(|v| *v >= 0.0),
    })
}

fn label(score: f64) -> &'static str {
    if score >= 80.0 {
        "Very Safe"
    } else if score >= 60.0 {
        "Safe"
    } else if score >= 40.0 {
        "Moderate"
    } else {
        "Unsafe"
    }
}
