//! Automated market valuation from a commercial AVM provider.
//!
//! POST with a JSON body; authenticates with the dual app-id/app-key header
//! pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use woonlens_core::{AddressKey, MarketValue, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Serialize)]
struct AvmRequest<'a> {
    post_code: &'a str,
    house_number: &'a str,
}

#[derive(Debug, Deserialize)]
struct AvmEnvelope {
    avm: Option<AvmBody>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AvmBody {
    value: Option<i64>,
    value_low: Option<i64>,
    value_high: Option<i64>,
    confidence: Option<f64>,
    valuation_date: Option<NaiveDate>,
}

/// # Errors
///
/// `ConfigMissing` without a URL, app id, and app key; otherwise the
/// underlying fetch errors.
pub async fn fetch_market_value(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    key: &AddressKey,
) -> Result<MarketValue, SourceError> {
    let (Some(url), Some(app_id), Some(app_key)) = (
        cfg.altum_url.as_deref(),
        cfg.altum_app_id.as_deref(),
        cfg.altum_app_key.as_deref(),
    ) else {
        return Err(SourceError::ConfigMissing);
    };

    let body = AvmRequest {
        post_code: &key.postcode,
        house_number: &key.house_number,
    };
    let envelope: AvmEnvelope = fetcher
        .post_json(
            deadline,
            "market_value",
            url,
            &[("x-app-id", app_id), ("x-app-key", app_key)],
            &body,
        )
        .await?;

    let avm = envelope.avm.unwrap_or_default();
    Ok(MarketValue {
        estimate_eur: avm.value,
        low_eur: avm.value_low,
        high_eur: avm.value_high,
        confidence: avm.confidence,
        reference_date: avm.valuation_date,
    })
}
