//! Registered energy label for the address. Header-keyed API.

use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{AddressKey, EnergyLabel, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LabelRow {
    #[serde(rename = "labelLetter")]
    label_letter: Option<String>,
    #[serde(rename = "energieindex")]
    energy_index: Option<f64>,
    #[serde(rename = "registratiedatum")]
    registered_at: Option<NaiveDate>,
    #[serde(rename = "geldigTot")]
    valid_until: Option<NaiveDate>,
}

/// # Errors
///
/// `ConfigMissing` without both a URL and an API key; `NotFound` when no
/// label is registered for the address; otherwise the underlying fetch
/// errors.
pub async fn fetch_energy_label(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    key: &AddressKey,
) -> Result<EnergyLabel, SourceError> {
    let (Some(base), Some(api_key)) =
        (cfg.ep_online_url.as_deref(), cfg.ep_online_api_key.as_deref())
    else {
        return Err(SourceError::ConfigMissing);
    };

    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("energy label base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("postcode", &key.postcode)
        .append_pair("huisnummer", &key.house_number);

    // The upstream expects the raw key in the Authorization header.
    let rows: Vec<LabelRow> = fetcher
        .get_json(
            deadline,
            "energy_label",
            url.as_str(),
            &[("authorization", api_key)],
        )
        .await?;

    let Some(row) = rows.into_iter().next() else {
        return Err(SourceError::NotFound {
            url: url.to_string(),
        });
    };

    Ok(EnergyLabel {
        label: row.label_letter,
        energy_index: row.energy_index,
        registered_at: row.registered_at,
        valid_until: row.valid_until,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_row_dates_parse_as_iso() {
        let row: LabelRow = serde_json::from_value(serde_json::json!({
            "labelLetter": "C",
            "energieindex": 1.4,
            "registratiedatum": "2021-03-15",
            "geldigTot": "2031-03-15"
        }))
        .unwrap();
        assert_eq!(row.label_letter.as_deref(), Some("C"));
        assert_eq!(
            row.registered_at,
            NaiveDate::from_ymd_opt(2021, 3, 15)
        );
    }
}
