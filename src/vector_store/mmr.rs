//! Maximal marginal relevance re-ranking.
//!
//! Picks results that are relevant to the query while penalising similarity to
//! results already picked, so the context is not filled with near-duplicate windows.

use super::cosine_similarity;

/// Select up to `k` candidate indices by maximal marginal relevance.
///
/// `lambda_mult` of 1.0 ranks purely by relevance; 0.0 purely by diversity.
/// The most relevant candidate is always picked first.
pub fn select(query: &[f32], candidates: &[Vec<f32>], k: usize, lambda_mult: f32) -> Vec<usize> {
    let target = k.min(candidates.len());
    if target == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let first = relevance
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut selected = vec![first];
    // Highest similarity of each candidate to anything selected so far
    let mut redundancy: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(c, &candidates[first]))
        .collect();

    while selected.len() < target {
        let mut best: Option<(usize, f32)> = None;

        for (i, score) in relevance.iter().enumerate() {
            if selected.contains(&i) {
                continue;
            }
            let mmr = lambda_mult * score - (1.0 - lambda_mult) * redundancy[i];
            if best.map_or(true, |(_, b)| mmr > b) {
                best = Some((i, mmr));
            }
        }

        let Some((pick, _)) = best else { break };
        selected.push(pick);

        for (i, candidate) in candidates.iter().enumerate() {
            let sim = cosine_similarity(candidate, &candidates[pick]);
            if sim > redundancy[i] {
                redundancy[i] = sim;
            }
        }
    }

    selected
}
