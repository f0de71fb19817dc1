//! Greedy maximal marginal relevance.

use crate::embedding::cosine_similarity;

/// Picks up to `k` candidate indices balancing query relevance against redundancy.
///
/// The most query-similar candidate is taken first; each following pick maximizes
/// `lambda * sim(query, c) - (1 - lambda) * max(sim(c, picked))`. Ties keep the earlier
/// candidate.
pub fn select(query: &[f32], candidates: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    let target = k.min(candidates.len());
    if target == 0 {
        return Vec::new();
    }

    let to_query: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let mut first = 0;
    for (i, score) in to_query.iter().enumerate() {
        if *score > to_query[first] {
            first = i;
        }
    }

    let mut picked = vec![first];
    // Max similarity of each candidate to anything picked so far.
    let mut redundancy: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(c, &candidates[first]))
        .collect();

    while picked.len() < target {
        let mut best: Option<(usize, f32)> = None;

        for (i, relevance) in to_query.iter().enumerate() {
            if picked.contains(&i) {
                continue;
            }
            let score = lambda * relevance - (1.0 - lambda) * redundancy[i];
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((i, score));
            }
        }

        let Some((next, _)) = best else { break };
        picked.push(next);

        for (i, c) in candidates.iter().enumerate() {
            redundancy[i] = redundancy[i].max(cosine_similarity(c, &candidates[next]));
        }
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_empty_inputs() {
        assert!(select(&[1.0, 0.0], &[], 3, 0.5).is_empty());
        assert!(select(&[1.0, 0.0], &[vec![1.0, 0.0]], 0, 0.5).is_empty());
    }

    #[test]
    fn test_select_skips_near_duplicate() {
        let query = [0.8, 0.6];
        let candidates = vec![
            vec![1.0, 0.0],
            vec![0.99, 0.01],
            vec![0.0, 1.0],
        ];

        assert_eq!(select(&query, &candidates, 2, 0.5), vec![1, 2]);
    }

    #[test]
    fn test_select_lambda_one_is_pure_relevance() {
        let query = [1.0, 0.0];
        let candidates = vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.99, 0.01],
        ];

        assert_eq!(select(&query, &candidates, 3, 1.0), vec![1, 2, 0]);
    }

    #[test]
    fn test_select_caps_at_candidate_count() {
        let candidates = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(select(&[1.0, 0.0], &candidates, 10, 0.5).len(), 2);
    }
}
