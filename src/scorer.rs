use crate::dependency::FilledDependency;
use crate::features::{FeatureId, Features};
use crate::sentence::Sentence;
use crate::supercat::{Provenance, SuperCatArena, SuperCatId, SuperCategory};
use crate::weights::{DepAttrs, DepNeuralScorer, DependencyIgnorePolicy, Weights};

/// Recursive score accumulation over a derivation subtree (spec.md §4.5).
/// Holds borrowed references to the external collaborators rather than
/// owning them, so one `Scorer` can be built per `parse_sentence` call and
/// threaded through every leaf/unary/binary node without cloning weights
/// or features.
///
/// Operates on a detached `&mut SuperCategory` plus its children's already
/// finalized scores, rather than an arena + id, so that cube pruning
/// (spec.md §4.2) can score a candidate result *before* deciding whether it
/// survives into the arena at all — scoring doesn't force allocation.
pub struct Scorer<'a> {
    features: &'a dyn Features,
    weights: &'a dyn Weights,
    dep_nn: Option<&'a dyn DepNeuralScorer>,
    ignore_policy: &'a dyn DependencyIgnorePolicy,
}

impl<'a> Scorer<'a> {
    pub fn new(
        features: &'a dyn Features,
        weights: &'a dyn Weights,
        dep_nn: Option<&'a dyn DepNeuralScorer>,
        ignore_policy: &'a dyn DependencyIgnorePolicy,
    ) -> Self {
        Self {
            features,
            weights,
            dep_nn,
            ignore_policy,
        }
    }

    /// `score = logPScore + sum(w[f] for f in leafFeatures(node, sentence))`.
    /// Must not be invoked twice for the same leaf (spec.md §4.5
    /// precondition) — asserted via `node.score.is_none()`.
    pub fn calc_score_leaf(&self, node: &mut SuperCategory, sentence: &Sentence, scratch: &mut Vec<FeatureId>) {
        assert!(
            node.score.is_none(),
            "calc_score_leaf invoked twice for the same leaf"
        );
        scratch.clear();
        self.features.collect_leaf_features(node, sentence, scratch);
        let feature_sum: f64 = scratch.iter().map(|&f| self.weights.weight(f)).sum();
        let log_p = node.log_p_score.expect("leaf node must carry a log_p_score");
        self.finalize_score(node, log_p + feature_sum, sentence);
    }

    /// `score = child.score + sum(w[f] for f in unaryFeatures(node, sentence))`.
    pub fn calc_score_unary(
        &self,
        node: &mut SuperCategory,
        child_score: f64,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
    ) {
        debug_assert!(matches!(node.provenance, Provenance::Unary { .. }));
        scratch.clear();
        self.features.collect_unary_features(node, sentence, scratch);
        let feature_sum: f64 = scratch.iter().map(|&f| self.weights.weight(f)).sum();
        self.finalize_score(node, child_score + feature_sum, sentence);
    }

    /// `score = left.score + right.score + sum(w[f] for f in binaryFeatures(...))`,
    /// plus root features when `at_root`.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_score_binary(
        &self,
        node: &mut SuperCategory,
        left_score: f64,
        right_score: f64,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
        at_root: bool,
    ) {
        debug_assert!(matches!(node.provenance, Provenance::Binary { .. }));
        scratch.clear();
        self.features.collect_binary_features(node, sentence, scratch);
        let mut feature_sum: f64 = scratch.iter().map(|&f| self.weights.weight(f)).sum();

        if at_root {
            scratch.clear();
            self.features.collect_root_features(node, sentence, scratch);
            feature_sum += scratch.iter().map(|&f| self.weights.weight(f)).sum::<f64>();
        }

        self.finalize_score(node, left_score + right_score + feature_sum, sentence);
    }

    /// Adds the neural dependency term (if a model is attached) and writes
    /// `score`/`log_dep_nn_score`, per spec.md §4.5's last paragraph.
    fn finalize_score(&self, node: &mut SuperCategory, base: f64, sentence: &Sentence) {
        match self.dep_nn {
            Some(model) => {
                let sum: f64 = node
                    .filled_deps
                    .iter()
                    .filter(|dep| !self.ignore_policy.ignore(dep, sentence))
                    .map(|dep| model.predict_soft(&dep_attrs(dep, sentence)).ln())
                    .sum();
                node.log_dep_nn_score = Some(sum);
                node.score = Some(base + self.weights.dep_nn_weight() * sum);
            }
            None => node.score = Some(base),
        }
    }
}

fn dep_attrs(dep: &FilledDependency, sentence: &Sentence) -> DepAttrs {
    let head = sentence.word((dep.head_index - 1) as usize);
    let filler = sentence.word((dep.filler_index - 1) as usize);
    DepAttrs {
        head_word: head.word.clone(),
        head_pos: head.pos.clone(),
        dep_word: filler.word.clone(),
        dep_pos: filler.pos.clone(),
        slot: dep.rel_id,
    }
}

/// Sums `logPScore` over every leaf reachable from `id` — a diagnostic
/// query used by training/evaluation tooling outside this crate's scope
/// (spec.md §4.5), not by the parser itself.
pub fn sum_leaf_initial_score(arena: &SuperCatArena, id: SuperCatId) -> f64 {
    let node = arena.get(id);
    match node.provenance {
        Provenance::Leaf { .. } => node.log_p_score.unwrap_or(0.0),
        Provenance::Unary { child } => sum_leaf_initial_score(arena, child),
        Provenance::Binary { left, right } => {
            sum_leaf_initial_score(arena, left) + sum_leaf_initial_score(arena, right)
        }
    }
}

/// `(total logDepNN of subtree) / (count of nodes)` — spec.md §4.5.
pub fn average_sum_dep_nn(arena: &SuperCatArena, id: SuperCatId) -> f64 {
    let (sum, count) = sum_dep_nn_and_count(arena, id);
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn sum_dep_nn_and_count(arena: &SuperCatArena, id: SuperCatId) -> (f64, usize) {
    let node = arena.get(id);
    let own = node.log_dep_nn_score.unwrap_or(0.0);
    match node.provenance {
        Provenance::Leaf { .. } => (own, 1),
        Provenance::Unary { child } => {
            let (s, c) = sum_dep_nn_and_count(arena, child);
            (own + s, c + 1)
        }
        Provenance::Binary { left, right } => {
            let (ls, lc) = sum_dep_nn_and_count(arena, left);
            let (rs, rc) = sum_dep_nn_and_count(arena, right);
            (own + ls + rs, lc + rc + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stub::StubFeatures;
    use crate::sentence::WordEntry;
    use crate::supercat::{Category, VarFrame};
    use crate::weights::stub::{ConstantDepNN, StubWeights};
    use crate::weights::IgnoreNothing;

    fn sentence(n: usize) -> Sentence {
        Sentence::new(
            (0..n)
                .map(|i| WordEntry {
                    word: format!("w{i}"),
                    pos: "X".into(),
                    supertags: Vec::new(),
                })
                .collect(),
        )
    }

    fn leaf(word: u32, position: u32, log_p: f64) -> SuperCategory {
        SuperCategory {
            category: Category::new("N"),
            filled_deps: Vec::new(),
            pending_deps: Vec::new(),
            provenance: Provenance::Leaf { word },
            var_frame: VarFrame::new(),
            position,
            span: 1,
            log_p_score: Some(log_p),
            score: None,
            log_dep_nn_score: None,
        }
    }

    #[test]
    fn leaf_score_is_log_p_plus_feature_weight() {
        let mut node = leaf(1, 0, -1.0);
        let features = StubFeatures::default(); // leaf_feature weight defaults to 1
        let weights = StubWeights::default(); // every feature weighs 1.0
        let ignore = IgnoreNothing;
        let scorer = Scorer::new(&features, &weights, None, &ignore);
        let mut scratch = Vec::new();
        let sent = sentence(1);

        scorer.calc_score_leaf(&mut node, &sent, &mut scratch);
        assert_eq!(node.score, Some(-1.0 + 1.0));
    }

    #[test]
    #[should_panic]
    fn double_scoring_a_leaf_panics() {
        let mut node = leaf(1, 0, -1.0);
        let features = StubFeatures::default();
        let weights = StubWeights::default();
        let ignore = IgnoreNothing;
        let scorer = Scorer::new(&features, &weights, None, &ignore);
        let mut scratch = Vec::new();
        let sent = sentence(1);

        scorer.calc_score_leaf(&mut node, &sent, &mut scratch);
        scorer.calc_score_leaf(&mut node, &sent, &mut scratch);
    }

    #[test]
    fn dep_nn_contributes_w_times_log_p() {
        use crate::dependency::Dependency;

        let dep = Dependency::new(0, 1, 0, 0, (0, 0), 1.0);
        let filled = FilledDependency::fill(&dep, 2);

        let mut arena = SuperCatArena::new();
        let left_id = arena.alloc(leaf(1, 0, -1.0));
        let right_id = arena.alloc(leaf(2, 1, -1.0));

        let mut node = SuperCategory {
            category: Category::new("S"),
            filled_deps: vec![filled],
            pending_deps: Vec::new(),
            provenance: Provenance::Binary {
                left: left_id,
                right: right_id,
            },
            var_frame: VarFrame::new(),
            position: 0,
            span: 2,
            log_p_score: None,
            score: None,
            log_dep_nn_score: None,
        };

        let features = StubFeatures::default();
        let weights = StubWeights {
            feature_weight: 0.0,
            dep_nn_weight: 1.0,
        };
        let dep_nn = ConstantDepNN { probability: 0.5 };
        let ignore = IgnoreNothing;
        let scorer = Scorer::new(&features, &weights, Some(&dep_nn), &ignore);
        let mut scratch = Vec::new();
        let sent = sentence(2);

        scorer.calc_score_binary(&mut node, -1.0, -1.0, &sent, &mut scratch, false);

        let expected_delta = 1.0 * 0.5f64.ln(); // |filledDeps| * log(0.5), |filledDeps| == 1
        assert!((node.score.unwrap() - (-1.0 + -1.0 + expected_delta)).abs() < 1e-9);
    }

    #[test]
    fn sum_leaf_initial_score_sums_reachable_leaves() {
        let mut arena = SuperCatArena::new();
        let a = arena.alloc(leaf(1, 0, -1.0));
        let b = arena.alloc(leaf(2, 1, -2.0));
        let binary = SuperCategory {
            category: Category::new("S"),
            filled_deps: Vec::new(),
            pending_deps: Vec::new(),
            provenance: Provenance::Binary { left: a, right: b },
            var_frame: VarFrame::new(),
            position: 0,
            span: 2,
            log_p_score: None,
            score: None,
            log_dep_nn_score: None,
        };
        let id = arena.alloc(binary);
        assert_eq!(sum_leaf_initial_score(&arena, id), -3.0);
    }
}
