//! Error types for the stop planner.
//!
//! Only [`PlannerError`] escapes [`crate::planner::plan`]. Provider and record
//! errors are recovered inside the planner and show up as empty results.

use thiserror::Error;

/// Fatal error returned by the planner.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Required external configuration is missing or unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The request was rejected before any computation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential was not supplied.
    #[error("missing required credential `{0}`")]
    MissingCredential(&'static str),
    /// A configuration value could not be parsed.
    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between -90 and 90, got {value}")]
    LatitudeOutOfRange { field: &'static str, value: f64 },
    #[error("{field} must be between -180 and 180, got {value}")]
    LongitudeOutOfRange { field: &'static str, value: f64 },
    #[error("maxStops must be between {min} and {max}, got {value}")]
    MaxStopsOutOfRange { value: usize, min: usize, max: usize },
}

/// Failure talking to a Directions or Places provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered but reported an error.
    #[error("provider returned {status}: {message}")]
    Status { status: String, message: String },
    /// The response body could not be interpreted.
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl From<PolylineError> for ProviderError {
    fn from(err: PolylineError) -> Self {
        ProviderError::Decode(err.to_string())
    }
}

/// A single external place record that could not be normalized.
#[derive(Debug, Error, PartialEq)]
pub enum RecordParseError {
    #[error("place record has no id")]
    MissingId,
    #[error("place {id} has no usable location")]
    MissingLocation { id: String },
    #[error("place {id} has an unparseable money value: {value}")]
    InvalidMoney { id: String, value: String },
    /// A field had the wrong shape, e.g. a latitude sent as a string.
    #[error("place {id} is malformed: {reason}")]
    Malformed { id: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum PolylineError {
    #[error("polyline truncated at byte {0}")]
    Truncated(usize),
    #[error("invalid polyline byte {byte:#04x} at {offset}")]
    InvalidByte { byte: u8, offset: usize },
}
