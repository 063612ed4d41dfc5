use std::net::SocketAddr;

use thiserror::Error;

use crate::app_config::{AppConfig, Environment, SourceEndpoints};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

// Public providers ship a default endpoint; setting the env var to an empty
// string disables the source outright.
const DEFAULT_LOCATIESERVER_URL: &str =
    "https://api.pdok.nl/bzk/locatieserver/search/v3_1/free";
const DEFAULT_REGION_WFS_URL: &str =
    "https://service.pdok.nl/cbs/wijkenbuurten/2024/wfs/v1_0";
const DEFAULT_BAG_URL: &str = "https://api.bag.kadaster.nl/lvbag/individuelebevragingen/v2";
const DEFAULT_CBS_ODATA_URL: &str = "https://opendata.cbs.nl/ODataApi/odata/85984NED";
const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_SOLAR_URL: &str = "https://api.zonnepanelen-check.nl/v1/potential";
const DEFAULT_LUCHTMEETNET_URL: &str = "https://api.luchtmeetnet.nl/open_api";
const DEFAULT_NOISE_URL: &str = "https://data.rivm.nl/geo/alo/geluid";
const DEFAULT_ELEVATION_URL: &str = "https://api.ellipsis-drive.com/v3/ahn/elevation";
const DEFAULT_SOIL_URL: &str = "https://api.bro.nl/sgm/v1/soil";
const DEFAULT_MONUMENTS_URL: &str =
    "https://api.cultureelerfgoed.nl/rijksmonumenten/v1/monumenten";
const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_OVAPI_URL: &str = "https://v0.ovapi.nl";
const DEFAULT_RDW_PARKING_URL: &str = "https://opendata.rdw.nl/resource/t5pc-eb34.json";
const DEFAULT_EP_ONLINE_URL: &str =
    "https://public.ep-online.nl/api/v5/PandEnergielabel/Adres";
const DEFAULT_WOZ_URL: &str = "https://api.wozwaardeloket.nl/wozwaarde/nummeraanduiding";
const DEFAULT_ALTUM_URL: &str = "https://api.altum.ai/avm";
const DEFAULT_SAFETY_URL: &str = "https://dataderden.cbs.nl/ODataApi/odata/81928NED";
const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic, decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // URL vars: unset → the default endpoint, empty string → disabled.
    let url = |var: &str, default: &str| -> Option<String> {
        match lookup(var) {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value),
            Err(_) => Some(default.to_string()),
        }
    };

    // Credential vars: unset or empty → the source stays disabled.
    let secret = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|value| !value.trim().is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("WOONLENS_ENV", "development"));
    let bind_addr = parse_addr("WOONLENS_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("WOONLENS_LOG_LEVEL", "info");
    let frontend_origin = secret("WOONLENS_FRONTEND_ORIGIN");

    let cache_ttl_secs = parse_u64("WOONLENS_CACHE_TTL_SECS", "900")?;
    let request_timeout_secs = parse_u64("WOONLENS_REQUEST_TIMEOUT_SECS", "30")?;
    let fetch_timeout_secs = parse_u64("WOONLENS_FETCH_TIMEOUT_SECS", "10")?;
    let fetch_max_retries = parse_u32("WOONLENS_FETCH_MAX_RETRIES", "2")?;
    let fetch_retry_delay_ms = parse_u64("WOONLENS_FETCH_RETRY_DELAY_MS", "200")?;
    let user_agent = or_default("WOONLENS_USER_AGENT", "woonlens/0.1 (address-aggregation)");

    let sources = SourceEndpoints {
        locatieserver_url: url("WOONLENS_LOCATIESERVER_URL", DEFAULT_LOCATIESERVER_URL),
        region_wfs_url: url("WOONLENS_REGION_WFS_URL", DEFAULT_REGION_WFS_URL),
        bag_url: url("WOONLENS_BAG_URL", DEFAULT_BAG_URL),
        bag_api_key: secret("WOONLENS_BAG_API_KEY"),
        cbs_odata_url: url("WOONLENS_CBS_ODATA_URL", DEFAULT_CBS_ODATA_URL),
        open_meteo_url: url("WOONLENS_OPEN_METEO_URL", DEFAULT_OPEN_METEO_URL),
        solar_url: url("WOONLENS_SOLAR_URL", DEFAULT_SOLAR_URL),
        solar_api_token: secret("WOONLENS_SOLAR_API_TOKEN"),
        luchtmeetnet_url: url("WOONLENS_LUCHTMEETNET_URL", DEFAULT_LUCHTMEETNET_URL),
        noise_url: url("WOONLENS_NOISE_URL", DEFAULT_NOISE_URL),
        elevation_url: url("WOONLENS_ELEVATION_URL", DEFAULT_ELEVATION_URL),
        soil_url: url("WOONLENS_SOIL_URL", DEFAULT_SOIL_URL),
        monuments_url: url("WOONLENS_MONUMENTS_URL", DEFAULT_MONUMENTS_URL),
        overpass_url: url("WOONLENS_OVERPASS_URL", DEFAULT_OVERPASS_URL),
        ovapi_url: url("WOONLENS_OVAPI_URL", DEFAULT_OVAPI_URL),
        rdw_parking_url: url("WOONLENS_RDW_PARKING_URL", DEFAULT_RDW_PARKING_URL),
        rdw_app_token: secret("WOONLENS_RDW_APP_TOKEN"),
        ep_online_url: url("WOONLENS_EP_ONLINE_URL", DEFAULT_EP_ONLINE_URL),
        ep_online_api_key: secret("WOONLENS_EP_ONLINE_API_KEY"),
        woz_url: url("WOONLENS_WOZ_URL", DEFAULT_WOZ_URL),
        altum_url: url("WOONLENS_ALTUM_URL", DEFAULT_ALTUM_URL),
        altum_app_id: secret("WOONLENS_ALTUM_APP_ID"),
        altum_app_key: secret("WOONLENS_ALTUM_APP_KEY"),
        safety_url: url("WOONLENS_SAFETY_URL", DEFAULT_SAFETY_URL),
        gemini_url: url("WOONLENS_GEMINI_URL", DEFAULT_GEMINI_URL),
        gemini_api_key: secret("WOONLENS_GEMINI_API_KEY"),
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        frontend_origin,
        cache_ttl_secs,
        request_timeout_secs,
        fetch_timeout_secs,
        fetch_max_retries,
        fetch_retry_delay_ms,
        user_agent,
        sources,
    })
}

/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(parse_environment("production"), Environment::Production);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("development"), Environment::Development);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn empty_env_yields_working_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should parse");
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.cache_ttl_secs, 900);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.fetch_timeout_secs, 10);
        assert_eq!(cfg.fetch_max_retries, 2);
        assert!(cfg.frontend_origin.is_none());
    }

    #[test]
    fn public_sources_are_enabled_by_default() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.sources.locatieserver_url.is_some());
        assert!(cfg.sources.cbs_odata_url.is_some());
        assert!(cfg.sources.overpass_url.is_some());
    }

    #[test]
    fn keyed_sources_start_without_credentials() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.sources.bag_api_key.is_none());
        assert!(cfg.sources.altum_app_id.is_none());
        assert!(cfg.sources.gemini_api_key.is_none());
    }

    #[test]
    fn empty_url_disables_the_source() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("WOONLENS_OPEN_METEO_URL", "");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.sources.open_meteo_url.is_none());
    }

    #[test]
    fn url_override_wins_over_default() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("WOONLENS_WOZ_URL", "http://localhost:9999/woz");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.sources.woz_url.as_deref(),
            Some("http://localhost:9999/woz")
        );
    }

    #[test]
    fn blank_credential_counts_as_unset() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("WOONLENS_EP_ONLINE_API_KEY", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.sources.ep_online_api_key.is_none());
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("WOONLENS_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WOONLENS_BIND_ADDR"),
            "expected InvalidEnvVar(WOONLENS_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn invalid_cache_ttl_is_rejected() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("WOONLENS_CACHE_TTL_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WOONLENS_CACHE_TTL_SECS"),
            "expected InvalidEnvVar(WOONLENS_CACHE_TTL_SECS), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("WOONLENS_GEMINI_API_KEY", "super-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
