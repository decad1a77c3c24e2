//! Google Places (New) HTTP adapter.
//!
//! Responses are normalized into [`RawPlace`] at this boundary. Each record
//! is decoded on its own: records with a malformed field, missing an id or a
//! location, or carrying money that cannot be read are skipped individually.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{ConfigError, ProviderError, RecordParseError};
use crate::models::{GeoPoint, Money, PriceValue, RawPlace};
use crate::traits::PlacesProvider;

pub const API_KEY_VAR: &str = "GOOGLE_PLACES_API_KEY";

const METERS_PER_MILE: f64 = 1609.344;

/// Largest radius the nearby search accepts.
const MAX_RADIUS_METERS: f64 = 50_000.0;

/// Largest page the API returns.
const MAX_RESULT_COUNT: usize = 20;

const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.addressComponents,places.location,places.rating,places.userRatingCount,\
places.types,places.priceLevel,places.fuelOptions";

#[derive(Debug, Clone)]
pub struct GooglePlacesConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Free-text query for along-route searches.
    pub text_query: String,
    /// Place type for radius searches.
    pub included_type: String,
}

impl Default for GooglePlacesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://places.googleapis.com/v1".to_string(),
            timeout_secs: 10,
            text_query: "truck stop".to_string(),
            included_type: "gas_station".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    config: GooglePlacesConfig,
    client: reqwest::blocking::Client,
}

impl GooglePlacesClient {
    pub fn new(config: GooglePlacesConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(API_KEY_VAR));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { config, client })
    }

    fn post(&self, method: &str, body: Value) -> Result<Vec<RawPlace>, ProviderError> {
        let url = format!("{}/places:{}", self.config.base_url.trim_end_matches('/'), method);
        debug!(%url, "requesting places");

        let response = self
            .client
            .post(url)
            .header("X-Goog-Api-Key", &self.config.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.to_string(),
                message: response.text().unwrap_or_default(),
            });
        }

        let body = response.json::<PlacesResponse>()?;
        Ok(normalize_places(body.places))
    }
}

impl PlacesProvider for GooglePlacesClient {
    fn search_radius(&self, center: GeoPoint, radius_miles: f64) -> Result<Vec<RawPlace>, ProviderError> {
        let radius = (radius_miles * METERS_PER_MILE).min(MAX_RADIUS_METERS);
        self.post(
            "searchNearby",
            json!({
                "includedTypes": [self.config.included_type],
                "maxResultCount": MAX_RESULT_COUNT,
                "locationRestriction": {
                    "circle": {
                        "center": { "latitude": center.lat, "longitude": center.lon },
                        "radius": radius,
                    }
                }
            }),
        )
    }

    fn search_along_route(&self, encoded_polyline: &str, max_results: usize) -> Result<Vec<RawPlace>, ProviderError> {
        self.post(
            "searchText",
            json!({
                "textQuery": self.config.text_query,
                "maxResultCount": max_results.clamp(1, MAX_RESULT_COUNT),
                "searchAlongRouteParameters": {
                    "polyline": { "encodedPolyline": encoded_polyline }
                }
            }),
        )
    }
}

/// Normalizes wire records, skipping the ones that fail.
fn normalize_places(places: Vec<Value>) -> Vec<RawPlace> {
    places
        .into_iter()
        .filter_map(|record| match normalize_place(record) {
            Ok(place) => Some(place),
            Err(err) => {
                warn!(error = %err, "skipping place record");
                None
            }
        })
        .collect()
}

fn normalize_place(record: Value) -> Result<RawPlace, RecordParseError> {
    let id = record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();
    let place = serde_json::from_value::<WirePlace>(record).map_err(|err| RecordParseError::Malformed {
        id,
        reason: err.to_string(),
    })?;
    RawPlace::try_from(place)
}

/// Records stay untyped until [`normalize_place`] so one bad record cannot
/// fail the whole page.
#[derive(Debug, Default, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WirePlace {
    id: Option<String>,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    address_components: Vec<AddressComponent>,
    location: Option<LatLng>,
    rating: Option<f64>,
    user_rating_count: Option<u32>,
    types: Vec<String>,
    price_level: Option<Value>,
    fuel_options: Option<FuelOptions>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddressComponent {
    long_text: Option<String>,
    short_text: Option<String>,
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FuelOptions {
    fuel_prices: Vec<FuelPriceEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FuelPriceEntry {
    #[serde(rename = "type")]
    fuel_type: Option<String>,
    price: Option<Value>,
}

impl TryFrom<WirePlace> for RawPlace {
    type Error = RecordParseError;

    fn try_from(place: WirePlace) -> Result<Self, Self::Error> {
        let id = place
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(RecordParseError::MissingId)?;

        let location = place
            .location
            .and_then(|loc| Some(GeoPoint::new(loc.latitude?, loc.longitude?)))
            .filter(|point| point.has_valid_lat() && point.has_valid_lon())
            .ok_or_else(|| RecordParseError::MissingLocation { id: id.clone() })?;

        let mut fuel_types = Vec::new();
        let mut fuel_prices = Vec::new();
        for entry in place.fuel_options.map(|options| options.fuel_prices).unwrap_or_default() {
            let fuel_type = entry.fuel_type.unwrap_or_default();
            if let Some(raw) = entry.price {
                let price = parse_price(&raw).ok_or_else(|| RecordParseError::InvalidMoney {
                    id: id.clone(),
                    value: raw.to_string(),
                })?;
                fuel_prices.push((fuel_type.clone(), price));
            }
            if !fuel_type.is_empty() {
                fuel_types.push(fuel_type);
            }
        }

        let price = fuel_prices
            .iter()
            .find(|(fuel, _)| fuel.eq_ignore_ascii_case("diesel"))
            .or_else(|| fuel_prices.first())
            .map(|(_, price)| *price)
            .or_else(|| place.price_level.as_ref().and_then(parse_price_level).map(PriceValue::Level));

        let component = |kind: &str| {
            place
                .address_components
                .iter()
                .find(|component| component.types.iter().any(|t| t == kind))
        };
        let city = component("locality").and_then(|c| c.long_text.clone().or_else(|| c.short_text.clone()));
        let state = component("administrative_area_level_1")
            .and_then(|c| c.short_text.clone().or_else(|| c.long_text.clone()));

        Ok(RawPlace {
            id,
            name: place.display_name.map(|name| name.text).unwrap_or_default(),
            formatted_address: place.formatted_address.unwrap_or_default(),
            city,
            state,
            location,
            rating: place.rating,
            review_count: place.user_rating_count,
            types: place.types,
            fuel_types,
            price,
        })
    }
}

/// Reads either a `{units, nanos}` money object or a plain number.
fn parse_price(value: &Value) -> Option<PriceValue> {
    match value {
        Value::Number(number) => number.as_f64().map(PriceValue::Number),
        Value::Object(fields) => {
            let units = match fields.get("units") {
                None | Some(Value::Null) => 0,
                Some(Value::String(text)) => text.trim().parse::<i64>().ok()?,
                Some(Value::Number(number)) => number.as_i64()?,
                Some(_) => return None,
            };
            let nanos = match fields.get("nanos") {
                None | Some(Value::Null) => 0,
                Some(Value::Number(number)) => i32::try_from(number.as_i64()?).ok()?,
                Some(_) => return None,
            };
            Some(PriceValue::Money(Money { units, nanos }))
        }
        _ => None,
    }
}

fn parse_price_level(value: &Value) -> Option<u8> {
    match value {
        Value::String(level) => match level.as_str() {
            "PRICE_LEVEL_INEXPENSIVE" => Some(1),
            "PRICE_LEVEL_MODERATE" => Some(2),
            "PRICE_LEVEL_EXPENSIVE" => Some(3),
            "PRICE_LEVEL_VERY_EXPENSIVE" => Some(4),
            _ => None,
        },
        Value::Number(number) => number
            .as_u64()
            .filter(|level| (1..=4).contains(level))
            .map(|level| level as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<RawPlace> {
        let response: PlacesResponse = serde_json::from_str(json).expect("should deserialise");
        normalize_places(response.places)
    }

    const FULL_PLACE: &str = r#"{
        "places": [{
            "id": "ChIJ-pilot-reno",
            "displayName": {"text": "Pilot Travel Center", "languageCode": "en"},
            "formattedAddress": "1 Truck Way, Reno, NV 89502, USA",
            "addressComponents": [
                {"longText": "Reno", "shortText": "Reno", "types": ["locality", "political"]},
                {"longText": "Nevada", "shortText": "NV", "types": ["administrative_area_level_1", "political"]}
            ],
            "location": {"latitude": 39.52, "longitude": -119.81},
            "rating": 4.1,
            "userRatingCount": 812,
            "types": ["gas_station", "convenience_store"],
            "priceLevel": "PRICE_LEVEL_MODERATE",
            "fuelOptions": {"fuelPrices": [
                {"type": "REGULAR_UNLEADED", "price": {"currencyCode": "USD", "units": "3", "nanos": 790000000}},
                {"type": "DIESEL", "price": {"currencyCode": "USD", "units": "4", "nanos": 190000000}}
            ]}
        }]
    }"#;

    #[test]
    fn test_normalizes_full_record() {
        let places = parse(FULL_PLACE);
        assert_eq!(places.len(), 1);
        let place = &places[0];
        assert_eq!(place.id, "ChIJ-pilot-reno");
        assert_eq!(place.name, "Pilot Travel Center");
        assert_eq!(place.city.as_deref(), Some("Reno"));
        assert_eq!(place.state.as_deref(), Some("NV"));
        assert_eq!(place.location, GeoPoint::new(39.52, -119.81));
        assert_eq!(place.review_count, Some(812));
        assert_eq!(place.fuel_types, vec!["REGULAR_UNLEADED", "DIESEL"]);
        let price = place.price.and_then(|p| p.fuel_price()).unwrap();
        assert!((price - 4.19).abs() < 1e-9, "diesel price preferred, got {}", price);
    }

    #[test]
    fn test_skips_records_without_id_or_location() {
        let places = parse(
            r#"{"places": [
                {"displayName": {"text": "No id"}, "location": {"latitude": 1.0, "longitude": 2.0}},
                {"id": "no-location"},
                {"id": "half-location", "location": {"latitude": 1.0}},
                {"id": "bad-location", "location": {"latitude": 95.0, "longitude": 2.0}},
                {"id": "ok", "location": {"latitude": 1.0, "longitude": 2.0}}
            ]}"#,
        );
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, "ok");
        assert_eq!(places[0].name, "");
        assert!(places[0].price.is_none());
    }

    #[test]
    fn test_skips_record_with_unparseable_money() {
        let places = parse(
            r#"{"places": [
                {"id": "bad", "location": {"latitude": 1.0, "longitude": 2.0},
                 "fuelOptions": {"fuelPrices": [{"type": "DIESEL", "price": {"units": "four"}}]}},
                {"id": "good", "location": {"latitude": 1.0, "longitude": 2.0},
                 "fuelOptions": {"fuelPrices": [{"type": "DIESEL", "price": 3.89}]}}
            ]}"#,
        );
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].price, Some(PriceValue::Number(3.89)));
    }

    #[test]
    fn test_malformed_record_does_not_drop_its_neighbours() {
        let places = parse(
            r#"{"places": [
                {"id": "good", "displayName": {"text": "Good Stop"},
                 "location": {"latitude": 1.0, "longitude": 2.0}},
                {"id": "string-lat", "location": {"latitude": "1.0", "longitude": 2.0}},
                {"id": "no-text", "displayName": {"languageCode": "en"},
                 "location": {"latitude": 1.0, "longitude": 2.0}},
                {"id": "negative-count", "userRatingCount": -3,
                 "location": {"latitude": 1.0, "longitude": 2.0}},
                {"id": 42, "location": {"latitude": 1.0, "longitude": 2.0}}
            ]}"#,
        );
        let ids: Vec<&str> = places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
        assert_eq!(places[0].name, "Good Stop");
    }

    #[test]
    fn test_malformed_record_error_names_the_place() {
        let err = normalize_place(json!({"id": "bad", "location": {"latitude": "1.0", "longitude": 2.0}}))
            .unwrap_err();
        assert!(matches!(err, RecordParseError::Malformed { ref id, .. } if id == "bad"));
    }

    #[test]
    fn test_price_level_when_no_fuel_prices() {
        let places = parse(
            r#"{"places": [{"id": "a", "location": {"latitude": 1.0, "longitude": 2.0}, "priceLevel": 3}]}"#,
        );
        assert_eq!(places[0].price, Some(PriceValue::Level(3)));
    }

    #[test]
    fn test_empty_response() {
        assert!(parse("{}").is_empty());
    }

    #[test]
    fn test_parse_money_variants() {
        assert_eq!(
            parse_price(&json!({"units": 3, "nanos": 500000000})),
            Some(PriceValue::Money(Money { units: 3, nanos: 500_000_000 }))
        );
        assert_eq!(
            parse_price(&json!({"nanos": 990000000})),
            Some(PriceValue::Money(Money { units: 0, nanos: 990_000_000 }))
        );
        assert_eq!(parse_price(&json!({"units": "x"})), None);
        assert_eq!(parse_price(&json!("3.99")), None);
    }

    #[test]
    fn test_parse_price_level_variants() {
        assert_eq!(parse_price_level(&json!("PRICE_LEVEL_INEXPENSIVE")), Some(1));
        assert_eq!(parse_price_level(&json!("PRICE_LEVEL_FREE")), None);
        assert_eq!(parse_price_level(&json!(4)), Some(4));
        assert_eq!(parse_price_level(&json!(7)), None);
    }

    #[test]
    fn test_client_requires_api_key() {
        let err = GooglePlacesClient::new(GooglePlacesConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(API_KEY_VAR)));
    }
}
