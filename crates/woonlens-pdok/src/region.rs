//! Point-in-polygon lookup of the neighbourhood containing an address.
//!
//! Queries the statistics office's boundary WFS with a small bounding box
//! around the address coordinates and takes the first feature. Failure here
//! is soft: the engine merely disables the region-keyed sources.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, RegionCodes};
use woonlens_fetch::{Fetcher, SourceError};

/// Half-size of the query box in metres. Small enough to stay inside one
/// neighbourhood, large enough to absorb centroid rounding.
const BBOX_HALF_SIZE_M: f64 = 100.0;

const METRES_PER_DEGREE_LAT: f64 = 111_320.0;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: NeighbourhoodProperties,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct NeighbourhoodProperties {
    buurtcode: Option<String>,
    buurtnaam: Option<String>,
    wijkcode: Option<String>,
    wijknaam: Option<String>,
    gemeentecode: Option<String>,
    gemeentenaam: Option<String>,
}

/// Resolves the neighbourhood, district, and municipality codes containing
/// the given coordinates.
///
/// # Errors
///
/// - [`SourceError::ConfigMissing`] when the WFS URL is not configured.
/// - [`SourceError::NotFound`] when no feature covers the point.
/// - Transport/status/decode errors from the underlying request.
pub async fn resolve_region(
    fetcher: &Fetcher,
    url: Option<&str>,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<RegionCodes, SourceError> {
    let base = url.ok_or(SourceError::ConfigMissing)?;
    let url = build_wfs_url(base, coordinates)?;

    let collection: FeatureCollection = fetcher
        .get_json(deadline, "region", url.as_str(), &[])
        .await?;

    let Some(feature) = collection.features.into_iter().next() else {
        return Err(SourceError::NotFound {
            url: url.to_string(),
        });
    };

    let props = feature.properties;
    Ok(RegionCodes {
        neighbourhood_code: props.buurtcode.unwrap_or_default(),
        neighbourhood_name: props.buurtnaam.unwrap_or_default(),
        district_code: props.wijkcode.unwrap_or_default(),
        district_name: props.wijknaam.unwrap_or_default(),
        municipality_code: props.gemeentecode.unwrap_or_default(),
        municipality_name: props.gemeentenaam.unwrap_or_default(),
    })
}

fn build_wfs_url(base: &str, coordinates: Coordinates) -> Result<Url, SourceError> {
    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("region WFS base URL '{base}'"),
        reason: e.to_string(),
    })?;

    let (min_lon, min_lat, max_lon, max_lat) = bbox_around(coordinates);
    url.query_pairs_mut()
        .append_pair("service", "WFS")
        .append_pair("version", "2.0.0")
        .append_pair("request", "GetFeature")
        .append_pair("typeNames", "wijkenbuurten:buurten")
        .append_pair("outputFormat", "application/json")
        .append_pair("srsName", "EPSG:4326")
        .append_pair(
            "bbox",
            &format!("{min_lat},{min_lon},{max_lat},{max_lon},urn:ogc:def:crs:EPSG::4326"),
        )
        .append_pair("count", "1");
    Ok(url)
}

/// A ~200 m square centred on the point, in degrees.
fn bbox_around(c: Coordinates) -> (f64, f64, f64, f64) {
    let d_lat = BBOX_HALF_SIZE_M / METRES_PER_DEGREE_LAT;
    let d_lon = BBOX_HALF_SIZE_M / (METRES_PER_DEGREE_LAT * c.latitude.to_radians().cos());
    (
        c.longitude - d_lon,
        c.latitude - d_lat,
        c.longitude + d_lon,
        c.latitude + d_lat,
    )
}
