//! External collaborator interfaces.
//!
//! The planner only talks to routing and place-search services through these
//! traits. Timeouts and transport concerns belong to the implementations.

use crate::error::ProviderError;
use crate::models::{GeoPoint, RawPlace};
use crate::route::RoutePath;

/// Provides a road route between two points.
pub trait DirectionsProvider {
    /// `Ok(None)` means the provider answered but found no usable route.
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<Option<RoutePath>, ProviderError>;
}

impl<T: DirectionsProvider + ?Sized> DirectionsProvider for Box<T> {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<Option<RoutePath>, ProviderError> {
        (**self).route(origin, destination)
    }
}

/// Searches for places near a point or along an encoded route.
///
/// Implementations normalize their wire format into [`RawPlace`] and drop
/// records that cannot be normalized.
pub trait PlacesProvider: Sync {
    fn search_radius(&self, center: GeoPoint, radius_miles: f64) -> Result<Vec<RawPlace>, ProviderError>;

    fn search_along_route(&self, encoded_polyline: &str, max_results: usize) -> Result<Vec<RawPlace>, ProviderError>;
}
