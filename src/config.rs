//! Environment-driven configuration.

use std::time::Duration;

use crate::error::ConfigError;
use crate::osrm::OsrmConfig;
use crate::places::{API_KEY_VAR, GooglePlacesConfig};
use crate::planner::PlanOptions;

pub const PLACES_BASE_URL_VAR: &str = "PLACES_BASE_URL";
pub const OSRM_BASE_URL_VAR: &str = "OSRM_BASE_URL";
pub const OSRM_PROFILE_VAR: &str = "OSRM_PROFILE";
pub const TIMEOUT_VAR: &str = "PROVIDER_TIMEOUT_SECS";
pub const CACHE_TTL_VAR: &str = "ROUTE_CACHE_TTL_SECS";

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub places: GooglePlacesConfig,
    /// `None` selects straight-line directions.
    pub osrm: Option<OsrmConfig>,
    pub options: PlanOptions,
    pub cache_ttl: Duration,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;
        let timeout_secs = parse_secs(TIMEOUT_VAR, get(TIMEOUT_VAR))?.unwrap_or(10);
        let cache_ttl_secs = parse_secs(CACHE_TTL_VAR, get(CACHE_TTL_VAR))?.unwrap_or(900);

        let mut places = GooglePlacesConfig {
            api_key,
            timeout_secs,
            ..Default::default()
        };
        if let Some(base_url) = get(PLACES_BASE_URL_VAR) {
            places.base_url = base_url;
        }

        let osrm = get(OSRM_BASE_URL_VAR).map(|base_url| OsrmConfig {
            base_url,
            profile: get(OSRM_PROFILE_VAR).unwrap_or_else(|| OsrmConfig::default().profile),
            timeout_secs,
        });

        Ok(Self {
            places,
            osrm,
            options: PlanOptions::default(),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

fn parse_secs(key: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|value| value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { key, value }))
        .transpose()
}
