//! Building facts from the buildings-and-addresses registry (BAG).
//!
//! Two sequential lookups: the accommodation object for surface and use, then
//! the building for its construction year. Requires an `X-Api-Key`.

use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Cadastral, Identifiers, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize)]
struct VboEnvelope {
    verblijfsobject: Option<Vbo>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Vbo {
    oppervlakte: Option<f64>,
    gebruiksdoelen: Vec<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PandEnvelope {
    pand: Option<Pand>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Pand {
    #[serde(rename = "oorspronkelijkBouwjaar")]
    oorspronkelijk_bouwjaar: Option<String>,
}

/// Fetches surface area, use purposes, status, and build year for the
/// resolved object.
///
/// # Errors
///
/// `ConfigMissing` without a URL and API key; `NotFound` when the record has
/// neither an accommodation nor a building identifier; otherwise the
/// underlying fetch errors.
pub async fn fetch_cadastral(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    identifiers: &Identifiers,
) -> Result<Cadastral, SourceError> {
    let (Some(base), Some(key)) = (cfg.bag_url.as_deref(), cfg.bag_api_key.as_deref()) else {
        return Err(SourceError::ConfigMissing);
    };
    if identifiers.accommodation_id.is_empty() && identifiers.building_id.is_empty() {
        return Err(SourceError::NotFound {
            url: base.to_owned(),
        });
    }

    let headers = [("x-api-key", key), ("accept-crs", "epsg:4258")];
    let mut out = Cadastral::default();

    if !identifiers.accommodation_id.is_empty() {
        let url = format!("{base}/verblijfsobjecten/{}", identifiers.accommodation_id);
        let envelope: VboEnvelope = fetcher
            .get_json_with_retry(deadline, "cadastral", &url, &headers)
            .await?;
        if let Some(vbo) = envelope.verblijfsobject {
            out.surface_m2 = vbo.oppervlakte;
            out.use_purposes = vbo.gebruiksdoelen;
            out.status = vbo.status;
        }
    }

    if !identifiers.building_id.is_empty() {
        let url = format!("{base}/panden/{}", identifiers.building_id);
        let envelope: PandEnvelope = fetcher
            .get_json_with_retry(deadline, "cadastral", &url, &headers)
            .await?;
        out.build_year = envelope
            .pand
            .and_then(|p| p.oorspronkelijk_bouwjaar)
            .and_then(|year| year.parse().ok());
    }

    Ok(out)
}
