//! Canonical address identity and the record produced by address resolution.

use serde::{Deserialize, Serialize};

/// Normalised (postcode, house number) pair identifying one request.
///
/// Equality of two keys defines cache identity: `"3541 ed"` and `"3541ED"`
/// normalise to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressKey {
    pub postcode: String,
    pub house_number: String,
}

impl AddressKey {
    /// Builds a key with canonical normalisation: the postcode is uppercased
    /// with all internal whitespace removed, the house number is trimmed.
    #[must_use]
    pub fn new(postcode: &str, house_number: &str) -> Self {
        let postcode = postcode
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        Self {
            postcode,
            house_number: house_number.trim().to_owned(),
        }
    }

    /// Deterministic cache key rendering.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.postcode, self.house_number)
    }
}

/// WGS84 point, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// A `(0, 0)` pair marks a record that never resolved; valid Dutch
    /// coordinates are never the null island.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.longitude == 0.0 && self.latitude == 0.0
    }
}

/// The identifiers the national address registry knows an object by.
///
/// At least one is non-empty for any resolved address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identifiers {
    pub accommodation_id: String,
    pub address_id: String,
    pub building_id: String,
    pub parcel_id: String,
}

impl Identifiers {
    /// The preferred downstream key: accommodation, then address, then
    /// building, then parcel. Deterministic for a given record.
    #[must_use]
    pub fn primary(&self) -> &str {
        [
            &self.accommodation_id,
            &self.address_id,
            &self.building_id,
            &self.parcel_id,
        ]
        .into_iter()
        .find(|id| !id.is_empty())
        .map_or("", String::as_str)
    }
}

/// Canonical record produced by the address resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub display_name: String,
    pub street: String,
    pub house_number: String,
    pub postcode: String,
    pub city: String,
    pub coordinates: Coordinates,
    /// Geometry of the object; a Point synthesised from the coordinates when
    /// the provider returned none.
    pub geojson: serde_json::Value,
    pub identifiers: Identifiers,
    pub municipality: String,
    pub municipality_code: String,
    pub province: String,
    pub province_code: String,
}

/// Administrative codes for the area containing an address, produced once per
/// request and consumed by the sources that accept only region codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionCodes {
    pub neighbourhood_code: String,
    pub neighbourhood_name: String,
    pub district_code: String,
    pub district_name: String,
    pub municipality_code: String,
    pub municipality_name: String,
}
