//! Descriptor matching helpers.

use featbench_core::{mean_std_dev, Match, MeanStdDev};

/// Number of differing bits between two binary descriptors.
#[inline]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(&x, &y)| (x ^ y).count_ones()).sum()
}

/// The `k` nearest `train` descriptors of every `query` descriptor, best first.
///
/// Ties keep the lower train index first.
pub fn knn_match_hamming<const N: usize>(
    train: &[[u8; N]],
    query: &[[u8; N]],
    k: usize,
) -> Vec<Vec<Match>> {
    query
        .iter()
        .enumerate()
        .map(|(qi, q)| {
            let mut best: Vec<Match> = Vec::with_capacity(k + 1);
            for (ti, t) in train.iter().enumerate() {
                let d = hamming_distance(q, t) as f32;
                let pos = best.partition_point(|m| m.distance <= d);
                if pos < k {
                    best.insert(pos, Match::new(qi, ti, d));
                    best.truncate(k);
                }
            }
            best
        })
        .collect()
}

/// Keep the best candidate of each list when it is clearly better than the
/// runner-up: `best.distance < ratio * second.distance`.
///
/// Lists with a single candidate pass unchanged; empty lists are dropped.
pub fn ratio_test(knn: &[Vec<Match>], ratio: f32) -> Vec<Match> {
    knn.iter()
        .filter_map(|candidates| match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            [best, second, ..] => (best.distance < ratio * second.distance).then_some(*best),
        })
        .collect()
}

/// Brute-force nearest-neighbour matching with optional filters.
///
/// With `cross_check`, a pair survives only when each side is the other's
/// nearest neighbour. With `max_ratio`, the nearest neighbour must beat the
/// second one by that factor.
pub fn match_hamming<const N: usize>(
    train: &[[u8; N]],
    query: &[[u8; N]],
    cross_check: bool,
    max_ratio: Option<f32>,
) -> Vec<Match> {
    if train.is_empty() || query.is_empty() {
        return Vec::new();
    }
    let knn = knn_match_hamming(train, query, 2);
    let forward = match max_ratio {
        Some(ratio) if ratio < 1.0 => ratio_test(&knn, ratio),
        _ => knn.iter().filter_map(|c| c.first().copied()).collect(),
    };
    if !cross_check {
        return forward;
    }

    let reverse = knn_match_hamming(query, train, 1);
    forward
        .into_iter()
        .filter(|m| {
            reverse[m.train_idx]
                .first()
                .is_some_and(|r| r.train_idx == m.query_idx)
        })
        .collect()
}

/// Mean and population standard deviation of match distances.
pub fn match_distance_statistics(matches: &[Match]) -> Option<MeanStdDev> {
    let distances: Vec<f32> = matches.iter().map(|m| m.distance).collect();
    mean_std_dev(&distances)
}
