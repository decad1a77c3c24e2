//! Candidate quality score.
//!
//! Each term is capped on its own. The route-deviation penalty is capped too,
//! so a strong candidate slightly off-route stays competitive.

use crate::models::{ProjectedCandidate, ScoredCandidate};

const RATING_WEIGHT: f64 = 4.0;
const MAX_RATING: f64 = 5.0;
const REVIEW_WEIGHT: f64 = 6.0;
const MAX_REVIEW_POINTS: f64 = 20.0;
const PARKING_BONUS: f64 = 8.0;
const DEVIATION_WEIGHT: f64 = 1.5;
const MAX_DEVIATION_PENALTY: f64 = 20.0;

pub fn score_candidate(projected: &ProjectedCandidate) -> f64 {
    let candidate = &projected.candidate;
    let rating = candidate.rating.min(MAX_RATING) * RATING_WEIGHT;
    let reviews = ((f64::from(candidate.review_count) + 1.0).log10() * REVIEW_WEIGHT).min(MAX_REVIEW_POINTS);
    let parking = if candidate.has_parking { PARKING_BONUS } else { 0.0 };
    let deviation = (projected.distance_from_route_miles * DEVIATION_WEIGHT).min(MAX_DEVIATION_PENALTY);

    rating + reviews + parking - deviation
}

impl From<ProjectedCandidate> for ScoredCandidate {
    fn from(projected: ProjectedCandidate) -> Self {
        let score = score_candidate(&projected);
        Self { projected, score }
    }
}
