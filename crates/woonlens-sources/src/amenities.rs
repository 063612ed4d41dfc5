//! Facilities within walking distance, with a 0–100 convenience score.
//!
//! The score blends category breadth, facility count, and mean distance:
//! `min(40, 8·categories) + min(30, 2·facilities) + max(0, 30·(1 − avg/1500))`.
//! It is computed over everything found; the stored list is sorted by
//! distance and truncated to the top 20.

use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Amenities, Coordinates, Facility, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

use crate::geo::haversine_m;

const SEARCH_RADIUS_M: f64 = 1500.0;
const MAX_LISTED: usize = 20;

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
    amenity: Option<String>,
}

/// # Errors
///
/// `ConfigMissing` without a URL; otherwise the underlying fetch errors.
pub async fn fetch_amenities(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Amenities, SourceError> {
    let base = cfg
        .overpass_url
        .as_deref()
        .ok_or(SourceError::ConfigMissing)?;

    let query = format!(
        "[out:json][timeout:10];node[\"amenity\"](around:{SEARCH_RADIUS_M},{},{});out;",
        coordinates.latitude, coordinates.longitude
    );
    let response: OverpassResponse = fetcher
        .post_form(deadline, "amenities", base, &[], &[("data", &query)])
        .await?;

    let mut facilities: Vec<Facility> = response
        .elements
        .into_iter()
        .filter_map(|element| {
            let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
                return None;
            };
            let category = element.tags.amenity?;
            let distance_m = haversine_m(
                coordinates,
                Coordinates {
                    longitude: lon,
                    latitude: lat,
                },
            );
            if distance_m > SEARCH_RADIUS_M {
                return None;
            }
            Some(Facility {
                name: element.tags.name.unwrap_or_else(|| category.clone()),
                category,
                distance_m,
            })
        })
        .collect();
    facilities.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

    let score = convenience_score(&facilities);
    let category_count = distinct_categories(&facilities);
    facilities.truncate(MAX_LISTED);

    Ok(Amenities {
        facilities,
        category_count,
        score,
    })
}

fn distinct_categories(facilities: &[Facility]) -> u32 {
    let categories: std::collections::HashSet<&str> =
        facilities.iter().map(|f| f.category.as_str()).collect();
    u32::try_from(categories.len()).unwrap_or(u32::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn convenience_score(facilities: &[Facility]) -> f64 {
    if facilities.is_empty() {
        return 0.0;
    }
    let categories = f64::from(distinct_categories(facilities));
    let count = facilities.len() as f64;
    let avg_distance =
        facilities.iter().map(|f| f.distance_m).sum::<f64>() / count;

    (8.0 * categories).min(40.0)
        + (2.0 * count).min(30.0)
        + (30.0 * (1.0 - avg_distance / SEARCH_RADIUS_M)).max(0.0)
}
