//! Assessed property value (WOZ) history for the address.

use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{SourceEndpoints, WozPoint, WozValuation};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize)]
struct WozEnvelope {
    #[serde(rename = "wozWaarden", default)]
    woz_waarden: Vec<WozRow>,
}

#[derive(Debug, Deserialize)]
struct WozRow {
    #[serde(rename = "peildatum")]
    reference_date: Option<NaiveDate>,
    #[serde(rename = "vastgesteldeWaarde")]
    value_eur: Option<i64>,
}

/// Fetches the valuation history keyed by the address identifier; the most
/// recent reference date becomes the current value.
///
/// # Errors
///
/// `ConfigMissing` without a URL; `NotFound` when the record carries no
/// address identifier; otherwise the underlying fetch errors.
pub async fn fetch_woz(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    address_id: &str,
) -> Result<WozValuation, SourceError> {
    let base = cfg.woz_url.as_deref().ok_or(SourceError::ConfigMissing)?;
    if address_id.is_empty() {
        return Err(SourceError::NotFound {
            url: base.to_owned(),
        });
    }

    let url = format!("{}/{address_id}", base.trim_end_matches('/'));
    let envelope: WozEnvelope = fetcher
        .get_json_with_retry(deadline, "woz", &url, &[])
        .await?;

    let mut history: Vec<WozPoint> = envelope
        .woz_waarden
        .into_iter()
        .filter_map(|row| {
            Some(WozPoint {
                reference_date: row.reference_date?,
                value_eur: row.value_eur?,
            })
        })
        .collect();
    history.sort_by_key(|point| point.reference_date);

    let current = history.last().cloned();
    Ok(WozValuation {
        value_eur: current.as_ref().map(|p| p.value_eur),
        reference_date: current.map(|p| p.reference_date),
        history,
    })
}
