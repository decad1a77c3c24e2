//! Polyline representation, downsampling and the compact encoded format.
//!
//! Geometries are kept decoded inside the planner. Encoding/decoding happens
//! at the boundary (when receiving from OSRM or sending to the Places API).

use serde::{Deserialize, Serialize};

use crate::error::PolylineError;
use crate::models::GeoPoint;

/// Default cap on vertices sent to an along-route search.
pub const DEFAULT_MAX_POINTS: usize = 180;

const PRECISION: f64 = 1e5;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Parses an encoded polyline string (precision 5).
    pub fn decode(encoded: &str) -> Result<Self, PolylineError> {
        decode(encoded).map(Self::new)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    /// Downsamples to at most `max_points` vertices and encodes the result.
    pub fn encode_simplified(&self, max_points: usize) -> String {
        encode(&simplify(&self.points, max_points))
    }
}

/// `count` indices spread evenly over `0..len`, first and last included.
///
/// Indices repeat when `count > len`.
pub fn evenly_spaced_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }
    let last = (len - 1) as f64;
    let steps = (count - 1) as f64;
    (0..count)
        .map(|i| ((i as f64 * last) / steps).round() as usize)
        .collect()
}

/// Keeps at most `max_points` coordinates, preserving the endpoints exactly.
pub fn simplify(coordinates: &[GeoPoint], max_points: usize) -> Vec<GeoPoint> {
    if coordinates.len() <= max_points {
        return coordinates.to_vec();
    }
    evenly_spaced_indices(coordinates.len(), max_points)
        .into_iter()
        .map(|index| coordinates[index])
        .collect()
}

/// Encodes coordinates with the delta + zigzag + base64-like polyline format.
pub fn encode(coordinates: &[GeoPoint]) -> String {
    let mut encoded = String::new();
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;

    for point in coordinates {
        let lat = (point.lat * PRECISION).round() as i64;
        let lon = (point.lon * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lon - prev_lon, &mut encoded);
        prev_lat = lat;
        prev_lon = lon;
    }

    encoded
}

fn encode_value(delta: i64, out: &mut String) {
    let mut shifted = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while shifted >= 0x20 {
        out.push(char::from((0x20 | (shifted & 0x1f)) as u8 + 63));
        shifted >>= 5;
    }
    out.push(char::from(shifted as u8 + 63));
}

/// Decodes a precision-5 encoded polyline.
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut offset = 0;
    let mut lat = 0i64;
    let mut lon = 0i64;
    let mut points = Vec::new();

    while offset < bytes.len() {
        lat += decode_value(bytes, &mut offset)?;
        lon += decode_value(bytes, &mut offset)?;
        points.push(GeoPoint::new(lat as f64 / PRECISION, lon as f64 / PRECISION));
    }

    Ok(points)
}

fn decode_value(bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0i64;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*offset).ok_or(PolylineError::Truncated(*offset))?;
        if !(63..127).contains(&byte) || shift > 60 {
            return Err(PolylineError::InvalidByte { byte, offset: *offset });
        }
        *offset += 1;
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(38.5, -120.2),
            GeoPoint::new(40.7, -120.95),
            GeoPoint::new(43.252, -126.453),
        ]
    }

    #[test]
    fn test_encode_golden_vector() {
        assert_eq!(encode(&golden_points()), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn test_decode_golden_vector() {
        let decoded = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(decoded.len(), 3);
        for (a, b) in decoded.iter().zip(golden_points()) {
            assert!((a.lat - b.lat).abs() < 1e-5);
            assert!((a.lon - b.lon).abs() < 1e-5);
        }
    }

    #[test]
    fn test_round_trip_within_precision() {
        let points = vec![
            GeoPoint::new(36.114_712, -115.172_831),
            GeoPoint::new(-33.868_82, 151.209_29),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(89.999_99, -179.999_99),
        ];
        let decoded = decode(&encode(&points)).unwrap();
        assert_eq!(decoded.len(), points.len());
        for (a, b) in decoded.iter().zip(&points) {
            assert!((a.lat - b.lat).abs() <= 1e-5 + 1e-12);
            assert!((a.lon - b.lon).abs() <= 1e-5 + 1e-12);
        }
    }

    #[test]
    fn test_empty_polyline() {
        assert_eq!(encode(&[]), "");
        assert!(decode("").unwrap().is_empty());
        assert!(Polyline::new(vec![]).points().is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        // Drop the final byte so the last longitude never terminates.
        let encoded = "_p~iF~ps|U_ulLnnqC_mqNvxq";
        assert!(matches!(decode(encoded), Err(PolylineError::Truncated(_))));
    }

    #[test]
    fn test_decode_rejects_invalid_byte() {
        assert!(matches!(
            decode("_p~iF ps|U"),
            Err(PolylineError::InvalidByte { byte: b' ', .. })
        ));
    }

    #[test]
    fn test_simplify_short_input_unchanged() {
        let points = golden_points();
        assert_eq!(simplify(&points, 180), points);
    }

    #[test]
    fn test_simplify_keeps_endpoints() {
        let points: Vec<GeoPoint> = (0..1000)
            .map(|i| GeoPoint::new(30.0 + i as f64 * 0.01, -100.0))
            .collect();
        let simplified = simplify(&points, DEFAULT_MAX_POINTS);
        assert_eq!(simplified.len(), DEFAULT_MAX_POINTS);
        assert_eq!(simplified.first(), points.first());
        assert_eq!(simplified.last(), points.last());
    }

    #[test]
    fn test_evenly_spaced_indices() {
        assert_eq!(evenly_spaced_indices(11, 3), vec![0, 5, 10]);
        assert_eq!(evenly_spaced_indices(2, 4), vec![0, 0, 1, 1]);
        assert_eq!(evenly_spaced_indices(5, 1), vec![0]);
        assert!(evenly_spaced_indices(0, 4).is_empty());
    }

    #[test]
    fn test_encode_simplified_round_trip() {
        let points: Vec<GeoPoint> = (0..400)
            .map(|i| GeoPoint::new(35.0 + i as f64 * 0.005, -110.0 + i as f64 * 0.003))
            .collect();
        let polyline = Polyline::new(points.clone());
        let decoded = Polyline::decode(&polyline.encode_simplified(50)).unwrap();
        assert_eq!(decoded.points().len(), 50);
        assert!((decoded.points()[49].lat - points[399].lat).abs() < 1e-5);
    }

    #[test]
    fn test_into_points() {
        let points = golden_points();
        assert_eq!(Polyline::new(points.clone()).into_points(), points);
    }
}
