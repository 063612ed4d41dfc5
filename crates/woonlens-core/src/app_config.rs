use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// CORS origin for the frontend; permissive when unset.
    pub frontend_origin: Option<String>,
    pub cache_ttl_secs: u64,
    /// Shared deadline for a whole aggregation request.
    pub request_timeout_secs: u64,
    /// Default per-call timeout of the HTTP client.
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_retry_delay_ms: u64,
    pub user_agent: String,
    pub sources: SourceEndpoints,
}

/// Per-source endpoint URLs and credentials.
///
/// An unset URL disables the source; an unset key disables the sources that
/// require authentication.
#[derive(Clone, Default)]
pub struct SourceEndpoints {
    pub locatieserver_url: Option<String>,
    pub region_wfs_url: Option<String>,
    pub bag_url: Option<String>,
    pub bag_api_key: Option<String>,
    pub cbs_odata_url: Option<String>,
    pub open_meteo_url: Option<String>,
    pub solar_url: Option<String>,
    pub solar_api_token: Option<String>,
    pub luchtmeetnet_url: Option<String>,
    pub noise_url: Option<String>,
    pub elevation_url: Option<String>,
    pub soil_url: Option<String>,
    pub monuments_url: Option<String>,
    pub overpass_url: Option<String>,
    pub ovapi_url: Option<String>,
    pub rdw_parking_url: Option<String>,
    pub rdw_app_token: Option<String>,
    pub ep_online_url: Option<String>,
    pub ep_online_api_key: Option<String>,
    pub woz_url: Option<String>,
    pub altum_url: Option<String>,
    pub altum_app_id: Option<String>,
    pub altum_app_key: Option<String>,
    pub safety_url: Option<String>,
    pub gemini_url: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("frontend_origin", &self.frontend_origin)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_retry_delay_ms", &self.fetch_retry_delay_ms)
            .field("user_agent", &self.user_agent)
            .field("sources", &self.sources)
            .finish()
    }
}

impl std::fmt::Debug for SourceEndpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[redacted]");
        f.debug_struct("SourceEndpoints")
            .field("locatieserver_url", &self.locatieserver_url)
            .field("region_wfs_url", &self.region_wfs_url)
            .field("bag_url", &self.bag_url)
            .field("bag_api_key", &redact(&self.bag_api_key))
            .field("cbs_odata_url", &self.cbs_odata_url)
            .field("open_meteo_url", &self.open_meteo_url)
            .field("solar_url", &self.solar_url)
            .field("solar_api_token", &redact(&self.solar_api_token))
            .field("luchtmeetnet_url", &self.luchtmeetnet_url)
            .field("noise_url", &self.noise_url)
            .field("elevation_url", &self.elevation_url)
            .field("soil_url", &self.soil_url)
            .field("monuments_url", &self.monuments_url)
            .field("overpass_url", &self.overpass_url)
            .field("ovapi_url", &self.ovapi_url)
            .field("rdw_parking_url", &self.rdw_parking_url)
            .field("rdw_app_token", &redact(&self.rdw_app_token))
            .field("ep_online_url", &self.ep_online_url)
            .field("ep_online_api_key", &redact(&self.ep_online_api_key))
            .field("woz_url", &self.woz_url)
            .field("altum_url", &self.altum_url)
            .field("altum_app_id", &redact(&self.altum_app_id))
            .field("altum_app_key", &redact(&self.altum_app_key))
            .field("safety_url", &self.safety_url)
            .field("gemini_url", &self.gemini_url)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .finish()
    }
}
