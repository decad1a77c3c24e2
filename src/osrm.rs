//! OSRM HTTP adapter for road routes.

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ProviderError};
use crate::models::GeoPoint;
use crate::polyline::Polyline;
use crate::route::RoutePath;
use crate::traits::DirectionsProvider;

const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { config, client })
    }

    fn route_url(&self, origin: GeoPoint, destination: GeoPoint) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=polyline",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat
        )
    }
}

impl DirectionsProvider for OsrmClient {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<Option<RoutePath>, ProviderError> {
        let url = self.route_url(origin, destination);
        debug!(%url, "requesting OSRM route");

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())?
            .json::<OsrmRouteResponse>()?;

        body.into_route_path()
    }
}

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
    /// Meters.
    distance: f64,
}

impl OsrmRouteResponse {
    fn into_route_path(self) -> Result<Option<RoutePath>, ProviderError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" => return Ok(None),
            _ => {
                return Err(ProviderError::Status {
                    status: self.code,
                    message: self.message.unwrap_or_default(),
                });
            }
        }

        let Some(route) = self.routes.into_iter().next() else {
            return Ok(None);
        };
        let points = Polyline::decode(&route.geometry)?.into_points();
        if points.len() < 2 {
            return Ok(None);
        }

        Ok(Some(
            RoutePath::from_coordinates(points).with_total_distance(route.distance / METERS_PER_MILE),
        ))
    }
}
