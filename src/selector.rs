//! Distributed stop selection.
//!
//! Rather than taking the N closest candidates, picks at most one
//! representative per fixed-width mileage bucket and then places them as
//! close as possible to evenly spaced interior targets along the route.

use std::collections::BTreeMap;

use crate::models::{ProjectedCandidate, ScoredCandidate};

/// Width of a clustering bucket along the route.
pub const BUCKET_MILES: f64 = 25.0;

/// Selects at most `max_stops` candidates, ordered by mileage.
///
/// When the pool already fits, every candidate is returned unscored.
/// Otherwise no two results share a bucket.
pub fn select_distributed(
    candidates: Vec<ProjectedCandidate>,
    total_distance_miles: f64,
    max_stops: usize,
) -> Vec<ProjectedCandidate> {
    if candidates.len() <= max_stops {
        let mut all = candidates;
        sort_by_mileage(&mut all);
        return all;
    }

    let representatives = bucket_representatives(candidates.into_iter().map(ScoredCandidate::from));
    let target_count = max_stops.min(representatives.len());
    let mut used = vec![false; representatives.len()];
    let mut chosen: Vec<usize> = Vec::with_capacity(max_stops);

    for slot in 1..=target_count {
        let target_miles = slot as f64 * total_distance_miles / (target_count + 1) as f64;
        let nearest = representatives
            .iter()
            .enumerate()
            .filter(|(index, _)| !used[*index])
            .min_by(|(_, a), (_, b)| {
                let a_gap = (a.projected.miles_along_route - target_miles).abs();
                let b_gap = (b.projected.miles_along_route - target_miles).abs();
                a_gap.total_cmp(&b_gap).then_with(|| b.score.total_cmp(&a.score))
            })
            .map(|(index, _)| index);

        if let Some(index) = nearest {
            used[index] = true;
            chosen.push(index);
        }
    }

    while chosen.len() < max_stops {
        let best = representatives
            .iter()
            .enumerate()
            .filter(|(index, _)| !used[*index])
            .max_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
            .map(|(index, _)| index);
        match best {
            Some(index) => {
                used[index] = true;
                chosen.push(index);
            }
            None => break,
        }
    }

    let mut selected: Vec<ProjectedCandidate> = representatives
        .into_iter()
        .enumerate()
        .filter(|(index, _)| used[*index])
        .map(|(_, scored)| scored.projected)
        .collect();
    sort_by_mileage(&mut selected);
    selected.truncate(max_stops);
    selected
}

pub fn bucket_of(miles_along_route: f64) -> i64 {
    (miles_along_route / BUCKET_MILES).floor() as i64
}

/// Highest-scoring candidate per bucket, in bucket order. Ties keep the
/// earlier candidate.
fn bucket_representatives(scored: impl Iterator<Item = ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut buckets: BTreeMap<i64, ScoredCandidate> = BTreeMap::new();
    for candidate in scored {
        let bucket = bucket_of(candidate.projected.miles_along_route);
        match buckets.get(&bucket) {
            Some(current) if current.score >= candidate.score => {}
            _ => {
                buckets.insert(bucket, candidate);
            }
        }
    }
    buckets.into_values().collect()
}

fn sort_by_mileage(candidates: &mut [ProjectedCandidate]) {
    candidates.sort_by(|a, b| a.miles_along_route.total_cmp(&b.miles_along_route));
}
