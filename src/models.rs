//! Request-scoped data model: points, raw places, candidates and the
//! response contract.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default number of stops returned when the caller does not say.
pub const DEFAULT_MAX_STOPS: usize = 5;
pub const MIN_MAX_STOPS: usize = 1;
pub const MAX_MAX_STOPS: usize = 10;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn has_valid_lat(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
    }

    pub fn has_valid_lon(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon)
    }
}

/// Fixed-point money as reported by the Places provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Money {
    pub units: i64,
    pub nanos: i32,
}

impl Money {
    pub fn value(&self) -> f64 {
        self.units as f64 + f64::from(self.nanos) / 1e9
    }
}

/// The price information a place may carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceValue {
    /// Coarse 1-4 price level. Not a per-unit fuel price.
    Level(u8),
    Money(Money),
    Number(f64),
}

impl PriceValue {
    pub fn fuel_price(&self) -> Option<f64> {
        match self {
            PriceValue::Level(_) => None,
            PriceValue::Money(money) => Some(money.value()),
            PriceValue::Number(value) => Some(*value),
        }
    }
}

/// An external place after boundary normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlace {
    pub id: String,
    pub name: String,
    pub formatted_address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub location: GeoPoint,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub types: Vec<String>,
    /// Fuel types with a listed price, e.g. `DIESEL`.
    pub fuel_types: Vec<String>,
    pub price: Option<PriceValue>,
}

impl RawPlace {
    /// Minimal place used by adapters' tests and mock providers.
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            formatted_address: String::new(),
            city: None,
            state: None,
            location,
            rating: None,
            review_count: None,
            types: Vec::new(),
            fuel_types: Vec::new(),
            price: None,
        }
    }
}

/// Brand classification of a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Brand {
    Pilot,
    FlyingJ,
    Loves,
    TravelCenters,
    Petro,
    Other,
}

impl Brand {
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("flying j") {
            Brand::FlyingJ
        } else if name.contains("pilot") {
            Brand::Pilot
        } else if name.contains("love's") || name.contains("loves") {
            Brand::Loves
        } else if name.contains("petro") && !name.contains("petroleum") {
            Brand::Petro
        } else if name.starts_with("ta ") || name.contains("travelcenters") || name == "ta" {
            Brand::TravelCenters
        } else {
            Brand::Other
        }
    }

    /// Chains that reliably offer truck parking and diesel.
    pub fn is_truck_stop_chain(&self) -> bool {
        !matches!(self, Brand::Other)
    }
}

const PARKING_HINTS: &[&str] = &["truck stop", "truck_stop", "travel center", "travel plaza", "parking"];

/// A point of interest eligible for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub brand: Brand,
    pub address: String,
    pub city: String,
    pub state: String,
    pub position: GeoPoint,
    pub rating: f64,
    pub review_count: u32,
    pub has_parking: bool,
    pub has_diesel: bool,
    pub amenities: Vec<String>,
    pub price: Option<f64>,
}

impl From<RawPlace> for Candidate {
    fn from(place: RawPlace) -> Self {
        let brand = Brand::classify(&place.name);
        let lower_name = place.name.to_lowercase();
        let has_parking = brand.is_truck_stop_chain()
            || PARKING_HINTS
                .iter()
                .any(|hint| lower_name.contains(hint) || place.types.iter().any(|t| t.contains(hint)));
        let has_diesel = brand.is_truck_stop_chain()
            || place
                .fuel_types
                .iter()
                .any(|fuel| fuel.eq_ignore_ascii_case("diesel"));

        let mut seen = HashSet::new();
        let amenities: Vec<String> = place
            .types
            .iter()
            .filter_map(|t| amenity_label(t))
            .chain(has_parking.then_some("Truck Parking"))
            .chain(has_diesel.then_some("Diesel"))
            .filter(|label| seen.insert(*label))
            .map(str::to_string)
            .collect();

        Self {
            id: place.id,
            name: place.name,
            brand,
            address: place.formatted_address,
            city: place.city.unwrap_or_default(),
            state: place.state.unwrap_or_default(),
            position: place.location,
            rating: place.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            review_count: place.review_count.unwrap_or(0),
            has_parking,
            has_diesel,
            amenities,
            price: place.price.and_then(|price| price.fuel_price()),
        }
    }
}

fn amenity_label(place_type: &str) -> Option<&'static str> {
    match place_type {
        "restaurant" | "fast_food_restaurant" => Some("Restaurant"),
        "convenience_store" => Some("Convenience Store"),
        "atm" => Some("ATM"),
        "car_wash" => Some("Car Wash"),
        "cafe" | "coffee_shop" => Some("Coffee"),
        "lodging" | "motel" => Some("Lodging"),
        "electric_vehicle_charging_station" => Some("EV Charging"),
        _ => None,
    }
}

/// A candidate positioned relative to the route.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCandidate {
    pub candidate: Candidate,
    pub miles_along_route: f64,
    pub distance_from_route_miles: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub projected: ProjectedCandidate,
    pub score: f64,
}

/// Caller input for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,
    #[serde(default = "default_max_stops")]
    pub max_stops: usize,
}

fn default_max_stops() -> usize {
    DEFAULT_MAX_STOPS
}

impl PlanRequest {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin_lat: origin.lat,
            origin_lon: origin.lon,
            dest_lat: destination.lat,
            dest_lon: destination.lon,
            max_stops: DEFAULT_MAX_STOPS,
        }
    }

    pub fn with_max_stops(mut self, max_stops: usize) -> Self {
        self.max_stops = max_stops;
        self
    }

    pub fn origin(&self) -> GeoPoint {
        GeoPoint::new(self.origin_lat, self.origin_lon)
    }

    pub fn destination(&self) -> GeoPoint {
        GeoPoint::new(self.dest_lat, self.dest_lon)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("originLat", self.origin_lat), ("destLat", self.dest_lat)] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(ValidationError::LatitudeOutOfRange { field, value });
            }
        }
        for (field, value) in [("originLon", self.origin_lon), ("destLon", self.dest_lon)] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(ValidationError::LongitudeOutOfRange { field, value });
            }
        }
        if !(MIN_MAX_STOPS..=MAX_MAX_STOPS).contains(&self.max_stops) {
            return Err(ValidationError::MaxStopsOutOfRange {
                value: self.max_stops,
                min: MIN_MAX_STOPS,
                max: MAX_MAX_STOPS,
            });
        }
        Ok(())
    }
}

/// One selected stop in the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelStop {
    pub id: String,
    pub name: String,
    pub brand: Brand,
    pub address: String,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub amenities: Vec<String>,
    pub distance_from_route: f64,
    pub miles_along_route: i64,
    pub has_parking: bool,
    pub has_diesel: bool,
    pub rating: f64,
    pub review_count: u32,
}

impl From<ProjectedCandidate> for FuelStop {
    fn from(projected: ProjectedCandidate) -> Self {
        let candidate = projected.candidate;
        Self {
            id: candidate.id,
            name: candidate.name,
            brand: candidate.brand,
            address: candidate.address,
            city: candidate.city,
            state: candidate.state,
            lat: candidate.position.lat,
            lon: candidate.position.lon,
            price: candidate.price,
            amenities: candidate.amenities,
            distance_from_route: (projected.distance_from_route_miles * 10.0).round() / 10.0,
            miles_along_route: projected.miles_along_route.round() as i64,
            has_parking: candidate.has_parking,
            has_diesel: candidate.has_diesel,
            rating: candidate.rating,
            review_count: candidate.review_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteInfo {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

/// The output contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub success: bool,
    pub fuel_stops: Vec<FuelStop>,
    pub total_distance_miles: i64,
    pub route_info: RouteInfo,
}
