//! The composite record: one flat field per downstream source, plus the
//! bookkeeping that says which sources contributed and which soft-failed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::address::{AddressRecord, RegionCodes};

/// Every downstream source, in declaration order.
///
/// The order here is the order of the composite's `sources` list — stable and
/// independent of adapter completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Cadastral,
    Demographics,
    Weather,
    Solar,
    AirQuality,
    Noise,
    FloodRisk,
    Soil,
    Monuments,
    Schools,
    Transit,
    Parking,
    EnergyLabel,
    Woz,
    MarketValue,
    Amenities,
    Safety,
    AiSummary,
}

impl Source {
    pub const ALL: [Source; 18] = [
        Source::Cadastral,
        Source::Demographics,
        Source::Weather,
        Source::Solar,
        Source::AirQuality,
        Source::Noise,
        Source::FloodRisk,
        Source::Soil,
        Source::Monuments,
        Source::Schools,
        Source::Transit,
        Source::Parking,
        Source::EnergyLabel,
        Source::Woz,
        Source::MarketValue,
        Source::Amenities,
        Source::Safety,
        Source::AiSummary,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Cadastral => "cadastral",
            Source::Demographics => "demographics",
            Source::Weather => "weather",
            Source::Solar => "solar",
            Source::AirQuality => "air_quality",
            Source::Noise => "noise",
            Source::FloodRisk => "flood_risk",
            Source::Soil => "soil",
            Source::Monuments => "monuments",
            Source::Schools => "schools",
            Source::Transit => "transit",
            Source::Parking => "parking",
            Source::EnergyLabel => "energy_label",
            Source::Woz => "woz",
            Source::MarketValue => "market_value",
            Source::Amenities => "amenities",
            Source::Safety => "safety",
            Source::AiSummary => "ai_summary",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Building and parcel facts from the cadastral registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cadastral {
    pub build_year: Option<i32>,
    pub surface_m2: Option<f64>,
    pub parcel_area_m2: Option<f64>,
    pub use_purposes: Vec<String>,
    pub status: Option<String>,
}

/// Neighbourhood statistics. Monetary amounts are in euros (the upstream
/// reports thousands; the adapter multiplies out).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Demographics {
    pub population: Option<i64>,
    pub households: Option<i64>,
    pub avg_income: Option<f64>,
    pub population_density: Option<i64>,
    pub avg_woz_value: Option<f64>,
    pub low_income_households: Option<i64>,
    pub owner_occupied_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weather {
    pub avg_temperature_c: Option<f64>,
    /// Converted from the provider's seconds.
    pub sunshine_hours: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub wind_speed_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Solar {
    pub annual_irradiation_kwh_m2: Option<f64>,
    pub suitable_roof_area_m2: Option<f64>,
    pub estimated_yield_kwh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AirQuality {
    pub station: Option<String>,
    pub station_distance_m: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub aqi: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Noise {
    pub road_db: Option<f64>,
    pub rail_db: Option<f64>,
    pub industry_db: Option<f64>,
    pub total_db: Option<f64>,
    pub category: Option<String>,
    pub exceeds_limit: bool,
}

/// Flood risk classification by terrain height relative to NAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloodRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FloodInfo {
    pub elevation_m: Option<f64>,
    pub risk: Option<FloodRisk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Soil {
    pub soil_code: Option<String>,
    pub soil_name: Option<String>,
    pub groundwater_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Monuments {
    pub count_within_500m: u32,
    pub nearest_name: Option<String>,
    pub nearest_distance_m: Option<f64>,
    pub is_listed_building: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolInfo {
    pub name: String,
    pub school_type: Option<String>,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schools {
    pub nearest: Vec<SchoolInfo>,
    pub count_within_1km: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transit {
    pub nearest_stop: Option<String>,
    pub nearest_stop_distance_m: Option<f64>,
    pub lines: Vec<String>,
    pub stops_within_500m: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingGarage {
    pub name: String,
    pub distance_m: f64,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parking {
    pub garages: Vec<ParkingGarage>,
    pub nearest_distance_m: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergyLabel {
    pub label: Option<String>,
    pub energy_index: Option<f64>,
    pub registered_at: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WozPoint {
    pub reference_date: NaiveDate,
    pub value_eur: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WozValuation {
    pub value_eur: Option<i64>,
    pub reference_date: Option<NaiveDate>,
    pub history: Vec<WozPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketValue {
    pub estimate_eur: Option<i64>,
    pub low_eur: Option<i64>,
    pub high_eur: Option<i64>,
    pub confidence: Option<f64>,
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub name: String,
    pub category: String,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Amenities {
    /// Sorted by distance, truncated to the top 20.
    pub facilities: Vec<Facility>,
    pub category_count: u32,
    /// 0–100.
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Safety {
    pub perception_score: Option<f64>,
    pub label: Option<String>,
    pub crimes_per_1000: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSummary {
    pub summary: String,
    pub generated: bool,
    pub error: Option<String>,
}

/// Numeric scores derived from the composite, plus the recommendations slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scores {
    pub esg: f64,
    pub profit: f64,
    pub opportunity: f64,
    pub overall: f64,
    pub risk_level: String,
    pub recommendations: Vec<String>,
}

/// The full merged result for one address.
///
/// Every enabled source appears in exactly one of `sources` or `errors`;
/// disabled sources appear in neither and keep their zero-valued field. The
/// record is immutable once handed to the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRecord {
    pub address: AddressRecord,
    pub region: Option<RegionCodes>,
    pub cadastral: Cadastral,
    pub demographics: Demographics,
    pub weather: Weather,
    pub solar: Solar,
    pub air_quality: AirQuality,
    pub noise: Noise,
    pub flood_risk: FloodInfo,
    pub soil: Soil,
    pub monuments: Monuments,
    pub schools: Schools,
    pub transit: Transit,
    pub parking: Parking,
    pub energy_label: EnergyLabel,
    pub woz: WozValuation,
    pub market_value: MarketValue,
    pub amenities: Amenities,
    pub safety: Safety,
    pub ai_summary: AiSummary,
    /// Source names that contributed a non-default value, declaration order.
    pub sources: Vec<String>,
    /// Source name → rendered error for the sources that soft-failed.
    pub errors: BTreeMap<String, String>,
    pub scores: Option<Scores>,
    /// Set when the record was served from the cache rather than built fresh.
    pub cached: bool,
}

impl CompositeRecord {
    /// A record with every source at its empty value, before fan-out.
    #[must_use]
    pub fn empty(address: AddressRecord) -> Self {
        Self {
            address,
            region: None,
            cadastral: Cadastral::default(),
            demographics: Demographics::default(),
            weather: Weather::default(),
            solar: Solar::default(),
            air_quality: AirQuality::default(),
            noise: Noise::default(),
            flood_risk: FloodInfo::default(),
            soil: Soil::default(),
            monuments: Monuments::default(),
            schools: Schools::default(),
            transit: Transit::default(),
            parking: Parking::default(),
            energy_label: EnergyLabel::default(),
            woz: WozValuation::default(),
            market_value: MarketValue::default(),
            amenities: Amenities::default(),
            safety: Safety::default(),
            ai_summary: AiSummary::default(),
            sources: Vec::new(),
            errors: BTreeMap::new(),
            scores: None,
            cached: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Coordinates;

    fn test_address() -> AddressRecord {
        AddressRecord {
            display_name: "Teststraat 1, 3541ED Utrecht".to_owned(),
            street: "Teststraat".to_owned(),
            house_number: "1".to_owned(),
            postcode: "3541ED".to_owned(),
            city: "Utrecht".to_owned(),
            coordinates: Coordinates {
                longitude: 5.0693,
                latitude: 52.1083,
            },
            geojson: serde_json::json!({"type": "Point", "coordinates": [5.0693, 52.1083]}),
            identifiers: crate::address::Identifiers::default(),
            municipality: "Utrecht".to_owned(),
            municipality_code: "GM0344".to_owned(),
            province: "Utrecht".to_owned(),
            province_code: "PV26".to_owned(),
        }
    }

    #[test]
    fn source_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for source in Source::ALL {
            assert!(seen.insert(source.as_str()), "duplicate name: {source}");
        }
    }

    #[test]
    fn empty_record_has_no_sources_or_errors() {
        let record = CompositeRecord::empty(test_address());
        assert!(record.sources.is_empty());
        assert!(record.errors.is_empty());
        assert!(record.scores.is_none());
        assert!(!record.cached);
        assert_eq!(record.demographics, Demographics::default());
    }

    #[test]
    fn composite_serialises_with_camel_case_keys() {
        let record = CompositeRecord::empty(test_address());
        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("airQuality").is_some());
        assert!(json.get("energyLabel").is_some());
        assert!(json["address"].get("displayName").is_some());
        assert_eq!(json["cached"], serde_json::json!(false));
    }
}
