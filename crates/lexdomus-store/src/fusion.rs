//! Linear score fusion of the lexical and vector rankings.
//!
//! Raw BM25 scores and cosine similarities live on different scales, so each
//! list is min-max scaled to `[0, 1]` before blending:
//! `fused = alpha * lexical + (1 - alpha) * vector`. A document present in
//! only one list gets only that list's term.

use std::collections::HashMap;

/// Min-max scale scores to `[0, 1]`. Constant lists (including a single
/// element) scale to `1.0`.
pub fn min_max(scores: &[(usize, f32)]) -> Vec<(usize, f32)> {
    let (lo, hi) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, s)| {
            (lo.min(s), hi.max(s))
        });
    let span = hi - lo;
    scores
        .iter()
        .map(|&(id, s)| {
            let norm = if span > f32::EPSILON { (s - lo) / span } else { 1.0 };
            (id, norm)
        })
        .collect()
}

/// Blend two rankings keyed by corpus position. Output is sorted by fused
/// score, descending; ties keep first appearance (lexical list first).
pub fn fuse(lexical: &[(usize, f32)], vector: &[(usize, f32)], alpha: f32) -> Vec<(usize, f32)> {
    let mut order: Vec<usize> = Vec::with_capacity(lexical.len() + vector.len());
    let mut fused: HashMap<usize, f32> = HashMap::new();

    let weighted = [(min_max(lexical), alpha), (min_max(vector), 1.0 - alpha)];
    for (list, weight) in &weighted {
        for &(id, s) in list {
            let slot = fused.entry(id).or_insert_with(|| {
                order.push(id);
                0.0
            });
            *slot += weight * s;
        }
    }

    let mut ranked: Vec<(usize, f32)> = order
        .into_iter()
        .map(|id| (id, fused.get(&id).copied().unwrap_or_default()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_scales_to_unit_range() {
        let scaled = min_max(&[(0, 4.0), (1, 2.0), (2, 3.0)]);
        assert_eq!(scaled, vec![(0, 1.0), (1, 0.0), (2, 0.5)]);
    }

    #[test]
    fn constant_list_scales_to_one() {
        assert_eq!(min_max(&[(7, 0.3)]), vec![(7, 1.0)]);
        assert_eq!(min_max(&[(1, 2.0), (2, 2.0)]), vec![(1, 1.0), (2, 1.0)]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn lexical_only_keeps_order() {
        let fused = fuse(&[(3, 9.0), (1, 5.0), (2, 1.0)], &[], 0.7);
        let ids: Vec<usize> = fused.iter().map(|f| f.0).collect();
        assert_eq!(ids, [3, 1, 2]);
        assert!((fused[0].1 - 0.7).abs() < 1e-6);
    }

    #[test]
    fn document_in_both_lists_accumulates() {
        // 0 tops lexical, 1 tops vector, 2 is second in both.
        let lexical = [(0, 10.0), (2, 5.0), (1, 0.0)];
        let vector = [(1, 0.9), (2, 0.5), (0, 0.1)];
        let fused = fuse(&lexical, &vector, 0.5);
        let score = |id: usize| fused.iter().find(|f| f.0 == id).unwrap().1;
        assert!((score(0) - 0.5).abs() < 1e-6);
        assert!((score(1) - 0.5).abs() < 1e-6);
        assert!((score(2) - 0.5).abs() < 1e-6);
        // Full tie: lexical appearance order wins.
        let ids: Vec<usize> = fused.iter().map(|f| f.0).collect();
        assert_eq!(ids, [0, 2, 1]);
    }

    #[test]
    fn alpha_one_ignores_vector() {
        let fused = fuse(&[(0, 1.0), (1, 0.5)], &[(1, 1.0), (5, 0.9)], 1.0);
        assert_eq!(fused[0].0, 0);
        let five = fused.iter().find(|f| f.0 == 5).unwrap();
        assert_eq!(five.1, 0.0);
    }
}
