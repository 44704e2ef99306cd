use crate::supercat::{SuperCatArena, SuperCatId};

/// β and beam-size pruning (spec.md §4.3), factored out of [`crate::chart::Cell`]
/// so the cutoff/cap logic has one implementation shared by leaf loading,
/// unary expansion, and binary combination — all three call sites prune
/// with the same primitive, differing only in `max_count`/`log_beta`.
///
/// Sorts `ids` descending by score, drops everything scoring below
/// `max_score + log_beta`, then truncates to `max_count` if `max_count >
/// 0`. Ties are broken by original (insertion) order, the single
/// tiebreaker spec.md §9 says implementations should pick and freeze.
///
/// Returns the number of entries dropped.
pub fn apply_beam(arena: &SuperCatArena, ids: &mut Vec<SuperCatId>, max_count: usize, log_beta: f64) -> usize {
    if ids.is_empty() {
        return 0;
    }

    // `sort_by` is stable, so entries with equal scores keep their
    // relative (insertion) order — the frozen tiebreaker from spec.md §9.
    ids.sort_by(|&a, &b| {
        arena
            .get(b)
            .sort_score()
            .partial_cmp(&arena.get(a).sort_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let max_score = arena.get(ids[0]).sort_score();
    let cutoff = max_score + log_beta;

    let before = ids.len();
    ids.retain(|&id| arena.get(id).sort_score() >= cutoff);

    if max_count > 0 && ids.len() > max_count {
        ids.truncate(max_count);
    }

    before - ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supercat::{Category, Provenance, VarFrame, SuperCategory};

    fn scored(score: f64) -> SuperCategory {
        SuperCategory {
            category: Category::new("N"),
            filled_deps: Vec::new(),
            pending_deps: Vec::new(),
            provenance: Provenance::Leaf { word: 1 },
            var_frame: VarFrame::new(),
            position: 0,
            span: 1,
            log_p_score: Some(score),
            score: Some(score),
            log_dep_nn_score: None,
        }
    }

    #[test]
    fn beta_zero_keeps_only_max() {
        let mut arena = SuperCatArena::new();
        let mut ids = vec![arena.alloc(scored(-1.0)), arena.alloc(scored(-3.0))];
        apply_beam(&arena, &mut ids, 0, 0.0);
        assert_eq!(ids.len(), 1);
        assert_eq!(arena.get(ids[0]).sort_score(), -1.0);
    }

    #[test]
    fn beam_cap_truncates_after_beta() {
        let mut arena = SuperCatArena::new();
        let mut ids = vec![
            arena.alloc(scored(-1.0)),
            arena.alloc(scored(-2.0)),
            arena.alloc(scored(-3.0)),
        ];
        let dropped = apply_beam(&arena, &mut ids, 1, -100.0);
        assert_eq!(dropped, 2);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn sorted_descending_after_pruning() {
        let mut arena = SuperCatArena::new();
        let mut ids = vec![
            arena.alloc(scored(-5.0)),
            arena.alloc(scored(-1.0)),
            arena.alloc(scored(-3.0)),
        ];
        apply_beam(&arena, &mut ids, 0, -100.0);
        let scores: Vec<f64> = ids.iter().map(|&id| arena.get(id).sort_score()).collect();
        assert_eq!(scores, vec![-1.0, -3.0, -5.0]);
    }
}
