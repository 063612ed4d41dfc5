//! Schools around the address, via an Overpass query.

use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, SchoolInfo, Schools, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

use crate::geo::haversine_m;

const SEARCH_RADIUS_M: f64 = 1500.0;
const NEARBY_RADIUS_M: f64 = 1000.0;
const MAX_LISTED: usize = 5;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: OverpassTags,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OverpassTags {
    name: Option<String>,
    #[serde(rename = "school:type")]
    school_type: Option<String>,
    #[serde(rename = "isced:level")]
    isced_level: Option<String>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_schools(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Schools, SourceError> {
    let base = cfg
        .overpass_url
        .as_deref()
        .ok_or(SourceError::ConfigMissing)?;

    let query = format!(
        "[out:json][timeout:10];node[\"amenity\"=\"school\"](around:{SEARCH_RADIUS_M},{},{});out;",
        coordinates.latitude, coordinates.longitude
    );
    let response: OverpassResponse = fetcher
        .post_form(deadline, "schools", base, &[], &[("data", &query)])
        .await?;

    let mut schools: Vec<SchoolInfo> = response
        .elements
        .into_iter()
        .filter_map(|element| {
            let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
                return None;
            };
            let distance_m = haversine_m(
                coordinates,
                Coordinates {
                    longitude: lon,
                    latitude: lat,
                },
            );
            Some(SchoolInfo {
                name: element.tags.name.unwrap_or_else(|| "onbekend".to_owned()),
                school_type: element.tags.school_type.or(element.tags.isced_level),
                distance_m,
            })
        })
        .collect();
    schools.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

    let count_within_1km = u32::try_from(
        schools
            .iter()
            .filter(|s| s.distance_m <= NEARBY_RADIUS_M)
            .count(),
    )
    .unwrap_or(u32::MAX);
    schools.truncate(MAX_LISTED);

    Ok(Schools {
        nearest: schools,
        count_within_1km,
    })
}
