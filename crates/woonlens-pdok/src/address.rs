//! Address resolution against the Locatieserver free-text search.
//!
//! This is the one resolver that may hard-fail: a request for an address the
//! registry does not know has no answer, so the whole pipeline aborts.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{AddressKey, AddressRecord, Coordinates, Identifiers};
use woonlens_fetch::{Fetcher, SourceError};

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<AddressDoc>,
}

/// One Locatieserver document. Everything except the centroid is optional in
/// practice; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct AddressDoc {
    weergavenaam: Option<String>,
    straatnaam: Option<String>,
    woonplaatsnaam: Option<String>,
    centroide_ll: Option<String>,
    adresseerbaarobject_id: Option<String>,
    nummeraanduiding_id: Option<String>,
    pand_id: Option<String>,
    perceel_id: Option<String>,
    id: Option<String>,
    gemeentenaam: Option<String>,
    gemeentecode: Option<String>,
    provincienaam: Option<String>,
    provinciecode: Option<String>,
}

/// Resolves a normalised (postcode, house number) pair into the canonical
/// [`AddressRecord`]: coordinates, display name, registry identifiers, and
/// municipality/province codes.
///
/// # Errors
///
/// - [`SourceError::ConfigMissing`] when the resolver URL is not configured.
/// - [`SourceError::NotFound`] when the registry returns no document.
/// - [`SourceError::Decode`] when the centroid WKT cannot be parsed.
/// - Transport/status errors from the underlying request.
pub async fn resolve_address(
    fetcher: &Fetcher,
    url: Option<&str>,
    deadline: Instant,
    key: &AddressKey,
) -> Result<AddressRecord, SourceError> {
    let base = url.ok_or(SourceError::ConfigMissing)?;
    let query = format!("{} {}", key.postcode, key.house_number);
    let url = build_search_url(base, &query)?;

    let envelope: SearchEnvelope = fetcher
        .get_json_with_retry(deadline, "address", url.as_str(), &[])
        .await?;

    let Some(doc) = envelope.response.docs.into_iter().next() else {
        tracing::info!(postcode = %key.postcode, number = %key.house_number, "address not found");
        return Err(SourceError::NotFound {
            url: url.to_string(),
        });
    };

    let wkt = doc.centroide_ll.as_deref().unwrap_or_default();
    let coordinates = parse_wkt_point(wkt)?;

    let street = doc.straatnaam.unwrap_or_default();
    let city = doc.woonplaatsnaam.unwrap_or_default();
    let display_name = doc.weergavenaam.filter(|name| !name.is_empty()).unwrap_or_else(|| {
        format!(
            "{street} {}, {} {city}",
            key.house_number, key.postcode
        )
    });

    let identifiers = Identifiers {
        accommodation_id: doc.adresseerbaarobject_id.unwrap_or_default(),
        address_id: doc.nummeraanduiding_id.unwrap_or_default(),
        building_id: doc.pand_id.unwrap_or_default(),
        parcel_id: doc
            .perceel_id
            .or(doc.id)
            .unwrap_or_default(),
    };

    Ok(AddressRecord {
        display_name,
        street,
        house_number: key.house_number.clone(),
        postcode: key.postcode.clone(),
        city,
        coordinates,
        geojson: point_geojson(coordinates),
        identifiers,
        municipality: doc.gemeentenaam.unwrap_or_default(),
        municipality_code: doc.gemeentecode.unwrap_or_default(),
        province: doc.provincienaam.unwrap_or_default(),
        province_code: doc.provinciecode.unwrap_or_default(),
    })
}

fn build_search_url(base: &str, query: &str) -> Result<Url, SourceError> {
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("address resolver base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("fq", "type:adres")
        .append_pair("rows", "1");
    Ok(url)
}

/// Parses a `POINT(lon lat)` WKT string by stripping the wrapper and
/// splitting on whitespace.
fn parse_wkt_point(wkt: &str) -> Result<Coordinates, SourceError> {
    let decode_err = |reason: &str| SourceError::Decode {
        context: format!("centroid WKT '{wkt}'"),
        reason: reason.to_owned(),
    };

    let inner = wkt
        .trim()
        .strip_prefix("POINT(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| decode_err("expected POINT(lon lat)"))?;

    let mut tokens = inner.split_whitespace();
    let (Some(lon), Some(lat)) = (tokens.next(), tokens.next()) else {
        return Err(decode_err("expected two coordinate tokens"));
    };

    let longitude: f64 = lon
        .parse()
        .map_err(|_| decode_err("longitude is not a number"))?;
    let latitude: f64 = lat
        .parse()
        .map_err(|_| decode_err("latitude is not a number"))?;

    Ok(Coordinates {
        longitude,
        latitude,
    })
}

/// Point geometry synthesised when the provider returns no geometry of its
/// own.
fn point_geojson(coordinates: Coordinates) -> serde_json::Value {
    serde_json::json!({
        "type": "Point",
        "coordinates": [coordinates.longitude, coordinates.latitude],
    })
}
