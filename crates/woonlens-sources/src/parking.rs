//! Parking facilities from the vehicle authority's open-data platform.
//!
//! Socrata-style endpoint: numbers arrive as strings and the auth token is a
//! query parameter.

use reqwest::Url;
use serde::Deserialize;
use tokio::time::Instant;

use woonlens_core::{Coordinates, Parking, ParkingGarage, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

use crate::geo::haversine_m;

const SEARCH_RADIUS_M: f64 = 1000.0;

#[derive(Debug, Deserialize)]
struct ParkingRow {
    areadesc: Option<String>,
    location: Option<RowLocation>,
    capacity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RowLocation {
    latitude: Option<String>,
    longitude: Option<String>,
}

/// # Errors
///
/// `ConfigMissing` without both a URL and an app token; otherwise the
/// underlying fetch errors.
pub async fn fetch_parking(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    coordinates: Coordinates,
) -> Result<Parking, SourceError> {
    let (Some(base), Some(token)) = (cfg.rdw_parking_url.as_deref(), cfg.rdw_app_token.as_deref())
    else {
        return Err(SourceError::ConfigMissing);
    };

    let mut url = Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("parking base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("$$app_token", token)
        .append_pair(
            "$where",
            &format!(
                "within_circle(location, {}, {}, {SEARCH_RADIUS_M})",
                coordinates.latitude, coordinates.longitude
            ),
        )
        .append_pair("$limit", "100");

    let rows: Vec<ParkingRow> = fetcher
        .get_json(deadline, "parking", url.as_str(), &[])
        .await?;

    let mut garages: Vec<ParkingGarage> = rows
        .into_iter()
        .filter_map(|row| {
            let location = row.location?;
            let lat: f64 = location.latitude?.parse().ok()?;
            let lon: f64 = location.longitude?.parse().ok()?;
            Some(ParkingGarage {
                name: row.areadesc.unwrap_or_else(|| "onbekend".to_owned()),
                distance_m: haversine_m(
                    coordinates,
                    Coordinates {
                        longitude: lon,
                        latitude: lat,
                    },
                ),
                capacity: row.capacity.and_then(|c| c.parse().ok()),
            })
        })
        .collect();
    garages.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

    Ok(Parking {
        nearest_distance_m: garages.first().map(|g| g.distance_m),
        garages,
    })
}
