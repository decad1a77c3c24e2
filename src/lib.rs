//! route-stops core
//!
//! Route-aware selection of evenly distributed stops (fuel, parking) between
//! an origin and a destination.

pub mod cache;
pub mod config;
pub mod error;
pub mod haversine;
pub mod models;
pub mod osrm;
pub mod places;
pub mod planner;
pub mod polyline;
pub mod route;
pub mod sampler;
pub mod scoring;
pub mod selector;
pub mod traits;
