//! Stop planner: ties routing, place search, projection and selection
//! together.
//!
//! A plan moves through a small state machine:
//!
//! ```text
//! NoRoute -> RouteFetched -> SearchedAlongRoute -> Selected
//!                                   |                 ^
//!                                   v                 |
//!                          FallbackWaypointSearch ----+
//! ```
//!
//! Provider failures never abort a plan. A missing route becomes a straight
//! line, a failed or empty along-route search falls back to per-waypoint
//! radius searches, and an empty pool is a valid (empty) selection.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::RouteCache;
use crate::error::{PlannerError, ProviderError};
use crate::models::{Candidate, FuelStop, GeoPoint, PlanRequest, PlanResponse, ProjectedCandidate, RawPlace, RouteInfo};
use crate::polyline::DEFAULT_MAX_POINTS;
use crate::route::RoutePath;
use crate::sampler::{build_linear_search_points, build_route_search_points};
use crate::selector::select_distributed;
use crate::traits::{DirectionsProvider, PlacesProvider};

#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Candidates farther than this from the route are dropped before scoring.
    pub max_route_deviation_miles: f64,
    /// Vertex cap for the encoded polyline sent to along-route searches.
    pub max_polyline_points: usize,
    pub along_route_max_results: usize,
    pub waypoint_radius_miles: f64,
    /// Upper bound on concurrent waypoint searches.
    pub max_concurrent_searches: usize,
    /// Caller-owned pool for waypoint searches. Without one, each fallback
    /// search builds a pool of `max_concurrent_searches` threads.
    pub search_pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_route_deviation_miles: 30.0,
            max_polyline_points: DEFAULT_MAX_POINTS,
            along_route_max_results: 20,
            waypoint_radius_miles: 25.0,
            max_concurrent_searches: 4,
            search_pool: None,
        }
    }
}

impl PlanOptions {
    /// Runs waypoint searches on `pool`, shared across plans.
    pub fn with_search_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.search_pool = Some(pool);
        self
    }
}

/// How the route for a plan was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Provider,
    Cache,
    /// Directions were unavailable; a two-point route was synthesized.
    StraightLine,
}

/// Which search produced the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    AlongRoute,
    Waypoints,
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub response: PlanResponse,
    pub route_source: RouteSource,
    pub strategy: SearchStrategy,
}

#[derive(Debug)]
enum PlanState {
    NoRoute,
    RouteFetched {
        route: RoutePath,
        source: RouteSource,
    },
    SearchedAlongRoute {
        route: RoutePath,
        source: RouteSource,
        candidates: Vec<ProjectedCandidate>,
    },
    FallbackWaypointSearch {
        route: RoutePath,
        source: RouteSource,
    },
    Selected {
        route: RoutePath,
        source: RouteSource,
        strategy: SearchStrategy,
        candidates: Vec<ProjectedCandidate>,
    },
}

impl PlanState {
    fn name(&self) -> &'static str {
        match self {
            PlanState::NoRoute => "no_route",
            PlanState::RouteFetched { .. } => "route_fetched",
            PlanState::SearchedAlongRoute { .. } => "searched_along_route",
            PlanState::FallbackWaypointSearch { .. } => "fallback_waypoint_search",
            PlanState::Selected { .. } => "selected",
        }
    }
}

/// Plans up to `request.max_stops` evenly distributed stops between the
/// request's origin and destination.
///
/// Only invalid input is an error; configuration errors surface earlier,
/// when the providers are built.
pub fn plan<D, P>(
    request: &PlanRequest,
    directions: &D,
    places: &P,
    options: &PlanOptions,
    cache: Option<&RouteCache>,
) -> Result<PlanOutcome, PlannerError>
where
    D: DirectionsProvider + ?Sized,
    P: PlacesProvider + ?Sized,
{
    request.validate()?;
    let origin = request.origin();
    let destination = request.destination();

    let mut state = PlanState::NoRoute;
    loop {
        debug!(state = state.name(), "plan transition");
        state = match state {
            PlanState::NoRoute => {
                let (route, source) = fetch_route(origin, destination, directions, options, cache);
                PlanState::RouteFetched { route, source }
            }
            PlanState::RouteFetched { route, source } => {
                let candidates = search_along_route(&route, places, options);
                PlanState::SearchedAlongRoute {
                    route,
                    source,
                    candidates,
                }
            }
            PlanState::SearchedAlongRoute {
                route,
                source,
                candidates,
            } => {
                if candidates.is_empty() {
                    PlanState::FallbackWaypointSearch { route, source }
                } else {
                    PlanState::Selected {
                        route,
                        source,
                        strategy: SearchStrategy::AlongRoute,
                        candidates,
                    }
                }
            }
            PlanState::FallbackWaypointSearch { route, source } => {
                let candidates = search_waypoints(request, &route, places, options);
                PlanState::Selected {
                    route,
                    source,
                    strategy: SearchStrategy::Waypoints,
                    candidates,
                }
            }
            PlanState::Selected {
                route,
                source,
                strategy,
                candidates,
            } => {
                let pool = candidates.len();
                let selected = select_distributed(candidates, route.total_distance_miles, request.max_stops);
                info!(
                    pool,
                    selected = selected.len(),
                    total_miles = route.total_distance_miles,
                    ?strategy,
                    ?source,
                    "stops selected"
                );

                return Ok(PlanOutcome {
                    response: PlanResponse {
                        success: true,
                        fuel_stops: selected.into_iter().map(FuelStop::from).collect(),
                        total_distance_miles: route.total_distance_miles.round() as i64,
                        route_info: RouteInfo { origin, destination },
                    },
                    route_source: source,
                    strategy,
                });
            }
        };
    }
}

fn fetch_route<D>(
    origin: GeoPoint,
    destination: GeoPoint,
    directions: &D,
    options: &PlanOptions,
    cache: Option<&RouteCache>,
) -> (RoutePath, RouteSource)
where
    D: DirectionsProvider + ?Sized,
{
    if let Some(route) = cache.and_then(|cache| cache.get(origin, destination)) {
        return (route, RouteSource::Cache);
    }

    match directions.route(origin, destination) {
        Ok(Some(route)) if route.coordinates.len() >= 2 => {
            let route = route.compact(options.max_polyline_points);
            if let Some(cache) = cache {
                cache.insert(origin, destination, route.clone());
            }
            (route, RouteSource::Provider)
        }
        Ok(_) => {
            warn!("directions returned no usable route, using straight line");
            (RoutePath::straight_line(origin, destination), RouteSource::StraightLine)
        }
        Err(err) => {
            warn!(error = %err, "directions failed, using straight line");
            (RoutePath::straight_line(origin, destination), RouteSource::StraightLine)
        }
    }
}

fn search_along_route<P>(route: &RoutePath, places: &P, options: &PlanOptions) -> Vec<ProjectedCandidate>
where
    P: PlacesProvider + ?Sized,
{
    let Some(encoded) = route.encoded_polyline.as_deref() else {
        debug!("no route polyline, skipping along-route search");
        return Vec::new();
    };

    match places.search_along_route(encoded, options.along_route_max_results) {
        Ok(found) => project_candidates(found, route, options),
        Err(err) => {
            warn!(error = %err, "along-route search failed");
            Vec::new()
        }
    }
}

fn search_waypoints<P>(
    request: &PlanRequest,
    route: &RoutePath,
    places: &P,
    options: &PlanOptions,
) -> Vec<ProjectedCandidate>
where
    P: PlacesProvider + ?Sized,
{
    let waypoints = if route.encoded_polyline.is_some() {
        build_route_search_points(&route.coordinates, route.total_distance_miles, request.max_stops)
    } else {
        build_linear_search_points(
            request.origin(),
            request.destination(),
            route.total_distance_miles,
            request.max_stops,
        )
    };
    debug!(waypoints = waypoints.len(), "searching around waypoints");

    let results = radius_searches(&waypoints, places, options);
    let found = waypoints
        .iter()
        .zip(results)
        .flat_map(|(waypoint, result)| match result {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, lat = waypoint.lat, lon = waypoint.lon, "waypoint search failed");
                Vec::new()
            }
        })
        .collect();

    project_candidates(found, route, options)
}

/// One tagged result per waypoint, in waypoint order.
fn radius_searches<P>(
    waypoints: &[GeoPoint],
    places: &P,
    options: &PlanOptions,
) -> Vec<Result<Vec<RawPlace>, ProviderError>>
where
    P: PlacesProvider + ?Sized,
{
    let search = |waypoint: &GeoPoint| places.search_radius(*waypoint, options.waypoint_radius_miles);

    if let Some(pool) = &options.search_pool {
        return pool.install(|| waypoints.par_iter().map(search).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_concurrent_searches.max(1))
        .build();
    match pool {
        Ok(pool) => pool.install(|| waypoints.par_iter().map(search).collect()),
        Err(err) => {
            warn!(error = %err, "search pool unavailable, searching sequentially");
            waypoints.iter().map(search).collect()
        }
    }
}

/// Turns raw places into route-relative candidates.
///
/// The first record seen for an id wins; places too far from the route are
/// dropped.
fn project_candidates(places: Vec<RawPlace>, route: &RoutePath, options: &PlanOptions) -> Vec<ProjectedCandidate> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| seen.insert(place.id.clone()))
        .filter_map(|place| {
            let projection = route.project(place.location);
            if projection.distance_from_route_miles > options.max_route_deviation_miles {
                debug!(id = %place.id, distance = projection.distance_from_route_miles, "dropping off-route place");
                return None;
            }
            Some(ProjectedCandidate {
                candidate: Candidate::from(place),
                miles_along_route: projection.miles_along_route,
                distance_from_route_miles: projection.distance_from_route_miles,
            })
        })
        .collect()
}
