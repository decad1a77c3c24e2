//! Great-circle distance and local tangent-plane projection.
//!
//! Also provides the straight-line directions provider used when no road
//! router is configured. Less accurate than OSRM (ignores roads) but always
//! available.

use crate::error::ProviderError;
use crate::models::GeoPoint;
use crate::route::RoutePath;
use crate::traits::DirectionsProvider;

/// Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

pub const MILES_PER_DEGREE_LAT: f64 = 69.0;

/// Miles per degree of longitude at the equator.
pub const MILES_PER_DEGREE_LON_EQUATOR: f64 = 69.172;

/// Calculate haversine distance between two points in miles.
pub fn haversine_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

/// Planar `(x, y)` offset of `point` from `reference`, in miles.
///
/// Only accurate near `reference`; callers re-center per segment instead of
/// using one reference for a whole route.
pub fn local_flat_projection(point: GeoPoint, reference: GeoPoint) -> (f64, f64) {
    let miles_per_degree_lon = reference.lat.to_radians().cos() * MILES_PER_DEGREE_LON_EQUATOR;
    let x = (point.lon - reference.lon) * miles_per_degree_lon;
    let y = (point.lat - reference.lat) * MILES_PER_DEGREE_LAT;
    (x, y)
}

/// Directions provider that always answers with the straight line between
/// origin and destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineDirections;

impl DirectionsProvider for StraightLineDirections {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<Option<RoutePath>, ProviderError> {
        Ok(Some(RoutePath::straight_line(origin, destination)))
    }
}
