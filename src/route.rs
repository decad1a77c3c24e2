//! Route geometry: along-route mileage and point-to-route projection.

use crate::haversine::{haversine_miles, local_flat_projection};
use crate::models::GeoPoint;
use crate::polyline::{encode, simplify};

/// A route with its cumulative mileage table.
///
/// `cumulative_miles` always has one entry per coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    pub coordinates: Vec<GeoPoint>,
    pub cumulative_miles: Vec<f64>,
    pub total_distance_miles: f64,
    pub encoded_polyline: Option<String>,
}

/// Where a point sits relative to a route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RouteProjection {
    pub miles_along_route: f64,
    pub distance_from_route_miles: f64,
}

impl RoutePath {
    /// Builds a route whose total distance is the summed segment lengths.
    pub fn from_coordinates(coordinates: Vec<GeoPoint>) -> Self {
        let cumulative_miles = build_cumulative_miles(&coordinates);
        let total_distance_miles = cumulative_miles.last().copied().unwrap_or(0.0);
        Self {
            coordinates,
            cumulative_miles,
            total_distance_miles,
            encoded_polyline: None,
        }
    }

    /// Two-point fallback route used when no road route is available.
    pub fn straight_line(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self::from_coordinates(vec![origin, destination])
    }

    /// Overrides the total with a provider-reported road distance.
    pub fn with_total_distance(mut self, miles: f64) -> Self {
        self.total_distance_miles = miles;
        self
    }

    /// Stores the simplified, encoded geometry for along-route searches.
    pub fn compact(mut self, max_points: usize) -> Self {
        self.encoded_polyline = Some(encode(&simplify(&self.coordinates, max_points)));
        self
    }

    pub fn project(&self, point: GeoPoint) -> RouteProjection {
        project_point_onto_route(point, &self.coordinates, &self.cumulative_miles)
    }
}

pub fn build_cumulative_miles(coordinates: &[GeoPoint]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(coordinates.len());
    let mut total = 0.0;
    for (i, point) in coordinates.iter().enumerate() {
        if i > 0 {
            total += haversine_miles(coordinates[i - 1], *point);
        }
        cumulative.push(total);
    }
    cumulative
}

/// Projects `point` onto the nearest route segment.
///
/// Each segment is flattened around its own midpoint, so distortion is
/// bounded by segment length rather than route length. Routes with fewer
/// than two coordinates project to `{0, 0}`.
pub fn project_point_onto_route(
    point: GeoPoint,
    coordinates: &[GeoPoint],
    cumulative_miles: &[f64],
) -> RouteProjection {
    let mut best: Option<(f64, RouteProjection)> = None;

    for (i, (pair, miles)) in coordinates
        .windows(2)
        .zip(cumulative_miles.windows(2))
        .enumerate()
    {
        let (start, end) = (pair[0], pair[1]);
        let reference = GeoPoint::new((start.lat + end.lat) / 2.0, (start.lon + end.lon) / 2.0);
        let (ax, ay) = local_flat_projection(start, reference);
        let (bx, by) = local_flat_projection(end, reference);
        let (px, py) = local_flat_projection(point, reference);

        let (seg_x, seg_y) = (bx - ax, by - ay);
        let length_sq = seg_x * seg_x + seg_y * seg_y;
        if length_sq == 0.0 {
            continue;
        }

        let t = (((px - ax) * seg_x + (py - ay) * seg_y) / length_sq).clamp(0.0, 1.0);
        let (nearest_x, nearest_y) = (ax + t * seg_x, ay + t * seg_y);
        let distance = ((px - nearest_x).powi(2) + (py - nearest_y).powi(2)).sqrt();
        if !distance.is_finite() {
            continue;
        }

        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            let segment_miles = miles[1] - miles[0];
            best = Some((
                distance,
                RouteProjection {
                    miles_along_route: cumulative_miles[i] + segment_miles * t,
                    distance_from_route_miles: distance,
                },
            ));
        }
    }

    best.map(|(_, projection)| projection).unwrap_or_default()
}
