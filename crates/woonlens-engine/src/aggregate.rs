//! Cache consultation, address resolution, and the concurrent fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use woonlens_core::{AddressKey, AppConfig, CompositeRecord, RegionCodes, Source};
use woonlens_fetch::{Fetcher, SourceError};
use woonlens_pdok::{resolve_address, resolve_region};
use woonlens_sources::{
    fetch_air_quality, fetch_amenities, fetch_cadastral, fetch_demographics, fetch_energy_label,
    fetch_flood_risk, fetch_market_value, fetch_monuments, fetch_noise, fetch_parking,
    fetch_safety, fetch_schools, fetch_soil, fetch_solar, fetch_transit, fetch_weather,
    fetch_woz,
};
use woonlens_sources::fetch_ai_summary;

use crate::cache::ResultCache;
use crate::scoring::compute_scores;

/// The only failures that reach the HTTP façade.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The address registry has no document for the key.
    #[error("address not found")]
    AddressNotFound,

    /// Address resolution failed for infrastructure reasons.
    #[error("address resolution failed: {0}")]
    Address(#[source] SourceError),
}

/// Owns the shared HTTP client, the configuration, and the result cache.
/// Read-only after construction; one instance serves all requests.
pub struct Engine {
    cfg: Arc<AppConfig>,
    fetcher: Fetcher,
    cache: ResultCache,
}

/// What one adapter produced: its value (possibly the default), and whether
/// it contributed, soft-failed, or was disabled by configuration.
struct Outcome<T> {
    value: T,
    error: Option<SourceError>,
    disabled: bool,
}

impl Engine {
    /// # Errors
    ///
    /// Returns [`SourceError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(cfg: Arc<AppConfig>) -> Result<Self, SourceError> {
        let fetcher = Fetcher::new(
            cfg.fetch_timeout_secs,
            &cfg.user_agent,
            cfg.fetch_max_retries,
            cfg.fetch_retry_delay_ms,
        )?;
        let cache = ResultCache::new(Duration::from_secs(cfg.cache_ttl_secs));
        Ok(Self {
            cfg,
            fetcher,
            cache,
        })
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Builds (or serves from cache) the composite record for one address.
    ///
    /// # Errors
    ///
    /// Only address-resolution failures propagate; every downstream source
    /// soft-fails into the composite's errors map.
    pub async fn aggregate(&self, key: &AddressKey) -> Result<CompositeRecord, AggregateError> {
        if let Some(hit) = self.cache.get(key).await {
            tracing::info!(key = %key.fingerprint(), "serving cached composite");
            return Ok(hit);
        }

        let deadline = Instant::now() + Duration::from_secs(self.cfg.request_timeout_secs);
        let endpoints = &self.cfg.sources;

        let address = resolve_address(
            &self.fetcher,
            endpoints.locatieserver_url.as_deref(),
            deadline,
            key,
        )
        .await
        .map_err(|e| match e {
            SourceError::NotFound { .. } => AggregateError::AddressNotFound,
            other => AggregateError::Address(other),
        })?;

        let coordinates = address.coordinates;
        let (region, region_error) = match resolve_region(
            &self.fetcher,
            endpoints.region_wfs_url.as_deref(),
            deadline,
            coordinates,
        )
        .await
        {
            Ok(codes) => (Some(codes), None),
            Err(SourceError::ConfigMissing) => (None, None),
            Err(err) => {
                tracing::warn!(error = %err, "region resolution soft-failed");
                (None, Some(err))
            }
        };
        let neighbourhood_code = region
            .as_ref()
            .map(|codes: &RegionCodes| codes.neighbourhood_code.clone());

        // All remaining sources run concurrently under the shared deadline.
        // The join arms are in source declaration order; completion order
        // never shows in the output.
        let (
            cadastral,
            demographics,
            weather,
            solar,
            air_quality,
            noise,
            flood_risk,
            soil,
            monuments,
            schools,
            transit,
            parking,
            energy_label,
            woz,
            market_value,
            amenities,
            safety,
        ) = tokio::join!(
            guard(deadline, Source::Cadastral, fetch_cadastral(
                &self.fetcher,
                endpoints,
                deadline,
                &address.identifiers
            )),
            guard(
                deadline,
                Source::Demographics,
                region_keyed(neighbourhood_code.as_deref(), |code| {
                    fetch_demographics(&self.fetcher, endpoints, deadline, code)
                })
            ),
            guard(deadline, Source::Weather, fetch_weather(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Solar, fetch_solar(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::AirQuality, fetch_air_quality(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Noise, fetch_noise(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::FloodRisk, fetch_flood_risk(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Soil, fetch_soil(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Monuments, fetch_monuments(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Schools, fetch_schools(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Transit, fetch_transit(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::Parking, fetch_parking(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(deadline, Source::EnergyLabel, fetch_energy_label(
                &self.fetcher,
                endpoints,
                deadline,
                key
            )),
            guard(deadline, Source::Woz, fetch_woz(
                &self.fetcher,
                endpoints,
                deadline,
                &address.identifiers.address_id
            )),
            guard(deadline, Source::MarketValue, fetch_market_value(
                &self.fetcher,
                endpoints,
                deadline,
                key
            )),
            guard(deadline, Source::Amenities, fetch_amenities(
                &self.fetcher,
                endpoints,
                deadline,
                coordinates
            )),
            guard(
                deadline,
                Source::Safety,
                region_keyed(neighbourhood_code.as_deref(), |code| {
                    fetch_safety(&self.fetcher, endpoints, deadline, code)
                })
            ),
        );

        let mut record = CompositeRecord::empty(address);
        record.sources.push("address".to_owned());
        match (region, region_error) {
            (Some(codes), _) => {
                record.region = Some(codes);
                record.sources.push("region".to_owned());
            }
            (None, Some(err)) => {
                record.errors.insert("region".to_owned(), err.to_string());
            }
            (None, None) => {}
        }

        apply(&mut record.sources, &mut record.errors, Source::Cadastral, cadastral, &mut record.cadastral);
        apply(&mut record.sources, &mut record.errors, Source::Demographics, demographics, &mut record.demographics);
        apply(&mut record.sources, &mut record.errors, Source::Weather, weather, &mut record.weather);
        apply(&mut record.sources, &mut record.errors, Source::Solar, solar, &mut record.solar);
        apply(&mut record.sources, &mut record.errors, Source::AirQuality, air_quality, &mut record.air_quality);
        apply(&mut record.sources, &mut record.errors, Source::Noise, noise, &mut record.noise);
        apply(&mut record.sources, &mut record.errors, Source::FloodRisk, flood_risk, &mut record.flood_risk);
        apply(&mut record.sources, &mut record.errors, Source::Soil, soil, &mut record.soil);
        apply(&mut record.sources, &mut record.errors, Source::Monuments, monuments, &mut record.monuments);
        apply(&mut record.sources, &mut record.errors, Source::Schools, schools, &mut record.schools);
        apply(&mut record.sources, &mut record.errors, Source::Transit, transit, &mut record.transit);
        apply(&mut record.sources, &mut record.errors, Source::Parking, parking, &mut record.parking);
        apply(&mut record.sources, &mut record.errors, Source::EnergyLabel, energy_label, &mut record.energy_label);
        apply(&mut record.sources, &mut record.errors, Source::Woz, woz, &mut record.woz);
        apply(&mut record.sources, &mut record.errors, Source::MarketValue, market_value, &mut record.market_value);
        apply(&mut record.sources, &mut record.errors, Source::Amenities, amenities, &mut record.amenities);
        apply(&mut record.sources, &mut record.errors, Source::Safety, safety, &mut record.safety);

        // The summariser runs last so it sees the finished composite; same
        // deadline, always soft.
        let summary = guard(
            deadline,
            Source::AiSummary,
            fetch_ai_summary(&self.fetcher, endpoints, deadline, &record),
        )
        .await;
        apply(&mut record.sources, &mut record.errors, Source::AiSummary, summary, &mut record.ai_summary);
        if let Some(message) = record.errors.get(Source::AiSummary.as_str()) {
            record.ai_summary.error = Some(message.clone());
        }

        record.scores = Some(compute_scores(&record));

        self.cache.put(key, &record).await;
        tracing::info!(
            key = %key.fingerprint(),
            contributed = record.sources.len(),
            failed = record.errors.len(),
            "composite assembled"
        );
        Ok(record)
    }
}

/// Skips a region-keyed source when region resolution produced no code.
async fn region_keyed<'a, T, F, Fut>(code: Option<&'a str>, fetch: F) -> Result<T, SourceError>
where
    F: FnOnce(&'a str) -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    match code {
        Some(code) if !code.is_empty() => fetch(code).await,
        _ => Err(SourceError::ConfigMissing),
    }
}

/// Wraps one adapter future with the shared deadline and folds its result
/// into the uniform [`Outcome`] shape.
async fn guard<T, Fut>(deadline: Instant, source: Source, fut: Fut) -> Outcome<T>
where
    T: Default,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(Ok(value)) => Outcome {
            value,
            error: None,
            disabled: false,
        },
        Ok(Err(SourceError::ConfigMissing)) => Outcome {
            value: T::default(),
            error: None,
            disabled: true,
        },
        Ok(Err(err)) => {
            tracing::warn!(source = %source, error = %err, "source soft-failed");
            Outcome {
                value: T::default(),
                error: Some(err),
                disabled: false,
            }
        }
        Err(_) => {
            tracing::warn!(source = %source, "source did not complete before the deadline");
            Outcome {
                value: T::default(),
                error: Some(SourceError::Timeout),
                disabled: false,
            }
        }
    }
}

/// Stores an outcome in the composite: the value always lands in its field;
/// the source name goes to exactly one of `sources` or `errors`, or neither
/// when disabled.
fn apply<T>(
    sources: &mut Vec<String>,
    errors: &mut BTreeMap<String, String>,
    source: Source,
    outcome: Outcome<T>,
    slot: &mut T,
) {
    *slot = outcome.value;
    if outcome.disabled {
        return;
    }
    match outcome.error {
        Some(err) => {
            errors.insert(source.as_str().to_owned(), err.to_string());
        }
        None => sources.push(source.as_str().to_owned()),
    }
}
