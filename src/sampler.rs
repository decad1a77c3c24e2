//! Search point sampling for radius-based place searches.

use std::collections::HashSet;

use crate::models::GeoPoint;
use crate::polyline::evenly_spaced_indices;

const MAX_ROUTE_SEARCH_POINTS: usize = 12;
const MIN_ROUTE_SEARCH_POINTS: usize = 4;
const MILES_PER_ROUTE_SEARCH_POINT: f64 = 120.0;

const MAX_LINEAR_INTERMEDIATES: usize = 8;
const MIN_LINEAR_INTERMEDIATES: usize = 2;
const MILES_PER_LINEAR_INTERMEDIATE: f64 = 150.0;

/// Evenly spaced search points taken from the route's own vertices.
pub fn build_route_search_points(
    coordinates: &[GeoPoint],
    total_distance_miles: f64,
    max_stops: usize,
) -> Vec<GeoPoint> {
    let by_distance = (total_distance_miles / MILES_PER_ROUTE_SEARCH_POINT).ceil().max(0.0) as usize;
    let desired = MIN_ROUTE_SEARCH_POINTS
        .max(max_stops + 2)
        .max(by_distance)
        .min(MAX_ROUTE_SEARCH_POINTS);

    dedupe_points(
        evenly_spaced_indices(coordinates.len(), desired)
            .into_iter()
            .map(|index| coordinates[index]),
    )
}

/// Straight-line sampling between origin and destination, used when there
/// is no route geometry. Interpolates in degrees, which is only good enough
/// for coarse sampling.
pub fn build_linear_search_points(
    origin: GeoPoint,
    destination: GeoPoint,
    total_distance_miles: f64,
    max_stops: usize,
) -> Vec<GeoPoint> {
    let by_distance = (total_distance_miles / MILES_PER_LINEAR_INTERMEDIATE).ceil().max(0.0) as usize;
    let intermediates = MIN_LINEAR_INTERMEDIATES
        .max(by_distance)
        .max(max_stops)
        .min(MAX_LINEAR_INTERMEDIATES);

    let steps = (intermediates + 1) as f64;
    let interior = (1..=intermediates).map(|i| {
        let fraction = i as f64 / steps;
        GeoPoint::new(
            origin.lat + (destination.lat - origin.lat) * fraction,
            origin.lon + (destination.lon - origin.lon) * fraction,
        )
    });

    dedupe_points(std::iter::once(origin).chain(interior).chain(std::iter::once(destination)))
}

/// Drops points that repeat an earlier one at 4-decimal precision.
fn dedupe_points(points: impl IntoIterator<Item = GeoPoint>) -> Vec<GeoPoint> {
    let mut seen = HashSet::new();
    points
        .into_iter()
        .filter(|point| seen.insert(point_key(*point)))
        .collect()
}

fn point_key(point: GeoPoint) -> (i64, i64) {
    ((point.lat * 1e4).round() as i64, (point.lon * 1e4).round() as i64)
}
