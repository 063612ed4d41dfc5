mod address;
mod app_config;
mod composite;
mod config;

pub use address::{AddressKey, AddressRecord, Coordinates, Identifiers, RegionCodes};
pub use app_config::{AppConfig, Environment, SourceEndpoints};
pub use composite::{
    AiSummary, AirQuality, Amenities, Cadastral, CompositeRecord, Demographics, EnergyLabel,
    Facility, FloodInfo, FloodRisk, MarketValue, Monuments, Noise, Parking, ParkingGarage, Safety,
    Schools, SchoolInfo, Scores, Soil, Solar, Source, Transit, Weather, WozPoint, WozValuation,
};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
