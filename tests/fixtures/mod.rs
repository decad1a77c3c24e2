//! Test fixtures for route-stops.
//!
//! Provides:
//! - A straight north-south route along the 100th meridian (~691 miles)
//! - Stop builders placed relative to that route
//! - Mock directions and places providers with call counters

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use route_stops::error::ProviderError;
use route_stops::haversine::haversine_miles;
use route_stops::models::{GeoPoint, RawPlace};
use route_stops::route::RoutePath;
use route_stops::traits::{DirectionsProvider, PlacesProvider};

pub const ROUTE_LON: f64 = -100.0;
pub const START_LAT: f64 = 30.0;
pub const END_LAT: f64 = 40.0;

pub fn origin() -> GeoPoint {
    GeoPoint::new(START_LAT, ROUTE_LON)
}

pub fn destination() -> GeoPoint {
    GeoPoint::new(END_LAT, ROUTE_LON)
}

/// 201 vertices, 0.05 degrees apart.
pub fn meridian_route() -> RoutePath {
    RoutePath::from_coordinates(
        (0..=200)
            .map(|i| GeoPoint::new(START_LAT + i as f64 * 0.05, ROUTE_LON))
            .collect(),
    )
}

/// A stop `miles_east` of the route at latitude `lat`.
pub fn stop_at(id: &str, lat: f64, miles_east: f64) -> RawPlace {
    let degrees = miles_east / (lat.to_radians().cos() * 69.172);
    let mut place = RawPlace::new(id, format!("Stop {id}"), GeoPoint::new(lat, ROUTE_LON + degrees));
    place.rating = Some(4.0);
    place.review_count = Some(100);
    place.formatted_address = format!("{id} Highway 83");
    place.city = Some("Somewhere".to_string());
    place.state = Some("KS".to_string());
    place
}

// ============================================================================
// Directions
// ============================================================================

pub enum DirectionsBehaviour {
    Route(RoutePath),
    NoRoute,
    Fail,
}

pub struct MockDirections {
    behaviour: DirectionsBehaviour,
    pub calls: AtomicUsize,
}

impl MockDirections {
    pub fn new(behaviour: DirectionsBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn meridian() -> Self {
        Self::new(DirectionsBehaviour::Route(meridian_route()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DirectionsProvider for MockDirections {
    fn route(&self, _origin: GeoPoint, _destination: GeoPoint) -> Result<Option<RoutePath>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            DirectionsBehaviour::Route(route) => Ok(Some(route.clone())),
            DirectionsBehaviour::NoRoute => Ok(None),
            DirectionsBehaviour::Fail => Err(ProviderError::Status {
                status: "503 Service Unavailable".to_string(),
                message: "router down".to_string(),
            }),
        }
    }
}

// ============================================================================
// Places
// ============================================================================

/// Places provider backed by a fixed set of places.
///
/// Radius searches return the known places within the radius of the center.
pub struct MockPlaces {
    along_route: Result<Vec<RawPlace>, String>,
    nearby: Vec<RawPlace>,
    fail_radius_north_of: Option<f64>,
    pub along_route_calls: AtomicUsize,
    pub radius_calls: AtomicUsize,
    pub polylines: Mutex<Vec<String>>,
    /// Names of the threads radius searches ran on.
    pub search_threads: Mutex<Vec<String>>,
}

impl MockPlaces {
    pub fn new() -> Self {
        Self {
            along_route: Ok(Vec::new()),
            nearby: Vec::new(),
            fail_radius_north_of: None,
            along_route_calls: AtomicUsize::new(0),
            radius_calls: AtomicUsize::new(0),
            polylines: Mutex::new(Vec::new()),
            search_threads: Mutex::new(Vec::new()),
        }
    }

    pub fn along_route(mut self, places: Vec<RawPlace>) -> Self {
        self.along_route = Ok(places);
        self
    }

    pub fn along_route_fails(mut self) -> Self {
        self.along_route = Err("quota exceeded".to_string());
        self
    }

    pub fn nearby(mut self, places: Vec<RawPlace>) -> Self {
        self.nearby = places;
        self
    }

    /// Radius searches centered north of `lat` fail.
    pub fn fail_radius_north_of(mut self, lat: f64) -> Self {
        self.fail_radius_north_of = Some(lat);
        self
    }

    pub fn along_route_count(&self) -> usize {
        self.along_route_calls.load(Ordering::SeqCst)
    }

    pub fn radius_count(&self) -> usize {
        self.radius_calls.load(Ordering::SeqCst)
    }
}

impl PlacesProvider for MockPlaces {
    fn search_radius(&self, center: GeoPoint, radius_miles: f64) -> Result<Vec<RawPlace>, ProviderError> {
        self.radius_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut threads) = self.search_threads.lock() {
            threads.push(std::thread::current().name().unwrap_or_default().to_string());
        }
        if self.fail_radius_north_of.is_some_and(|lat| center.lat > lat) {
            return Err(ProviderError::Decode("timed out".to_string()));
        }
        Ok(self
            .nearby
            .iter()
            .filter(|place| haversine_miles(center, place.location) <= radius_miles)
            .cloned()
            .collect())
    }

    fn search_along_route(&self, encoded_polyline: &str, _max_results: usize) -> Result<Vec<RawPlace>, ProviderError> {
        self.along_route_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut polylines) = self.polylines.lock() {
            polylines.push(encoded_polyline.to_string());
        }
        self.along_route.clone().map_err(|message| ProviderError::Status {
            status: "429 Too Many Requests".to_string(),
            message,
        })
    }
}
