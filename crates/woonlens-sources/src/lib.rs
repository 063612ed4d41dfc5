//! One adapter per downstream data source.
//!
//! Every adapter follows the same contract: given the shared [`Fetcher`], the
//! configured endpoints, the request deadline, and the slice of identifiers
//! it needs, it returns its typed payload or a [`SourceError`]. A missing
//! endpoint URL or credential surfaces as `SourceError::ConfigMissing`, which
//! the engine treats as "disabled": the payload stays at its `Default` and
//! no error is recorded. Everything else is a soft failure recorded per
//! source — no adapter failure aborts the pipeline.
//!
//! [`Fetcher`]: woonlens_fetch::Fetcher
//! [`SourceError`]: woonlens_fetch::SourceError

mod air_quality;
mod amenities;
mod cadastral;
mod demographics;
mod energy_label;
mod flood;
mod geo;
mod market_value;
mod monuments;
mod noise;
mod parking;
mod safety;
mod schools;
mod soil;
mod solar;
mod summary;
mod transit;
mod weather;
mod woz;

pub use air_quality::fetch_air_quality;
pub use amenities::fetch_amenities;
pub use cadastral::fetch_cadastral;
pub use demographics::fetch_demographics;
pub use energy_label::fetch_energy_label;
pub use flood::fetch_flood_risk;
pub use geo::haversine_m;
pub use market_value::fetch_market_value;
pub use monuments::fetch_monuments;
pub use noise::fetch_noise;
pub use parking::fetch_parking;
pub use safety::fetch_safety;
pub use schools::fetch_schools;
pub use soil::fetch_soil;
pub use solar::fetch_solar;
pub use summary::fetch_ai_summary;
pub use transit::fetch_transit;
pub use weather::fetch_weather;
pub use woz::fetch_woz;
