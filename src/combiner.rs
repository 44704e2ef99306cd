use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use float_ord::FloatOrd;
use tracing::debug;

use crate::chart::Chart;
use crate::features::FeatureId;
use crate::rule_engine::RuleEngine;
use crate::scorer::Scorer;
use crate::sentence::Sentence;
use crate::supercat::{SuperCatId, SuperCategory};

/// A cube-pruning queue entry: either a real combination result, or the
/// sentinel "no result here, still advance the frontier" (spec.md §4.2/§9).
/// An explicit tagged variant rather than a null pointer, per the design
/// note's call to make the sentinel a first-class value.
#[derive(Debug, Clone, Copy)]
enum Candidate {
    Real(SuperCatId),
    Empty,
}

/// One entry in the cube-pruning priority queue. Ordered by `score` only —
/// sentinel entries carry `FloatOrd(f64::NEG_INFINITY)` so they always sort
/// below any real result and never get popped ahead of one still waiting in
/// the queue.
struct HeapEntry {
    score: FloatOrd<f64>,
    candidate: Candidate,
    li: usize,
    ri: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

/// Binary combination of two cells, with a cube-pruning k-best path
/// (spec.md §4.2). Free functions rather than a struct with state: a
/// combination step needs nothing but the chart, the two source cells, and
/// the external collaborators, all passed in per call — there's no
/// per-combiner state worth keeping across calls.
///
/// Plain mode is grounded on `forest.rs::extend_out`'s recursive
/// Cartesian-style enumeration over split points, generalized from
/// "enumerate every combination of sub-forest states" to "enumerate every
/// (left, right) supercategory pair." Cube-pruning mode is grounded on
/// `examples/other_examples` pcfg_tool's `unary_closure`, which solves the
/// same "max-heap pop, relax neighbours, reinsert" problem for a 1-D unary
/// chain closure; here it's adapted to a 2-D frontier over two sorted axes.
pub struct Combiner;

impl Combiner {
    /// Combines `cell(left_position, left_span)` with `cell(right_position,
    /// right_span)` into `cell(target_position, target_span)` for one split
    /// point. In plain mode, results are appended directly into the target
    /// cell. In cube-pruning mode, results are staged (spec.md §4.2's
    /// `preSuperCategories`); the caller runs
    /// [`Combiner::combine_pre_super_categories`] once after every split for
    /// this cell has been combined.
    #[allow(clippy::too_many_arguments)]
    pub fn combine_split(
        chart: &mut Chart,
        target_position: usize,
        target_span: usize,
        left_position: usize,
        left_span: usize,
        right_position: usize,
        right_span: usize,
        rules: &dyn RuleEngine,
        scorer: &Scorer,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
        cube_pruning: bool,
        beam_size: usize,
        at_root: bool,
    ) {
        let left_ids: Vec<SuperCatId> = chart.cell(left_position, left_span).iter().collect();
        let right_ids: Vec<SuperCatId> = chart.cell(right_position, right_span).iter().collect();

        if left_ids.is_empty() || right_ids.is_empty() {
            return;
        }

        let use_cube = cube_pruning && beam_size > 0 && left_ids.len() * right_ids.len() > beam_size;

        let results = if use_cube {
            Self::cube_prune(
                chart, &left_ids, &right_ids, rules, scorer, sentence, scratch, at_root, beam_size,
            )
        } else {
            if cube_pruning {
                debug!(
                    left = left_ids.len(),
                    right = right_ids.len(),
                    beam_size,
                    "cube pruning falling back to full enumeration"
                );
            }
            Self::full_enumeration(chart, &left_ids, &right_ids, rules, scorer, sentence, scratch, at_root)
        };

        if cube_pruning {
            chart.cell_mut(target_position, target_span).stage(results);
        } else {
            chart.cell_mut(target_position, target_span).add_no_dp(results);
        }
    }

    /// Merges a cell's per-split staging lists into one, sorts descending
    /// by score, and caps at `k` (spec.md §4.2's `combinePreSuperCategories`).
    /// A no-op in plain mode, since nothing is ever staged there.
    pub fn combine_pre_super_categories(chart: &mut Chart, position: usize, span: usize, k: usize) {
        let mut staged: Vec<SuperCatId> = chart.cell(position, span).staged().to_vec();
        if staged.is_empty() {
            return;
        }

        staged.sort_by(|&a, &b| {
            chart
                .arena()
                .get(b)
                .sort_score()
                .partial_cmp(&chart.arena().get(a).sort_score())
                .unwrap_or(Ordering::Equal)
        });
        if k > 0 && staged.len() > k {
            staged.truncate(k);
        }

        chart.cell_mut(position, span).commit_staged(staged);
    }

    fn full_enumeration(
        chart: &mut Chart,
        left_ids: &[SuperCatId],
        right_ids: &[SuperCatId],
        rules: &dyn RuleEngine,
        scorer: &Scorer,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
        at_root: bool,
    ) -> Vec<SuperCatId> {
        let mut out = Vec::with_capacity(left_ids.len() * right_ids.len());
        for &left_id in left_ids {
            for &right_id in right_ids {
                out.extend(Self::apply_rules_and_score(
                    chart, left_id, right_id, rules, scorer, sentence, scratch, at_root,
                ));
            }
        }
        out
    }

    /// Applies `rules.combine` to one (left, right) pair, scores every
    /// resulting supercategory, and allocates each into the arena. Returns
    /// the empty `Vec` when the rule engine proposes nothing, per spec.md
    /// §6's "never throw on absence of a rule."
    #[allow(clippy::too_many_arguments)]
    fn apply_rules_and_score(
        chart: &mut Chart,
        left_id: SuperCatId,
        right_id: SuperCatId,
        rules: &dyn RuleEngine,
        scorer: &Scorer,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
        at_root: bool,
    ) -> Vec<SuperCatId> {
        let (left_score, right_score, results) = {
            let left = chart.arena().get(left_id);
            let right = chart.arena().get(right_id);
            let left_score = left.score.expect("left child must already be scored");
            let right_score = right.score.expect("right child must already be scored");
            (left_score, right_score, rules.combine(left, right, sentence))
        };

        results
            .into_iter()
            .map(|result| {
                let mut node = {
                    let left = chart.arena().get(left_id);
                    let right = chart.arena().get(right_id);
                    SuperCategory::new_binary(left_id, left, right_id, right, result)
                };
                scorer.calc_score_binary(&mut node, left_score, right_score, sentence, scratch, at_root);
                chart.arena_mut().alloc(node)
            })
            .collect()
    }

    /// k-best over the monotonic 2-D frontier of `left_ids x right_ids`,
    /// per spec.md §4.2's algorithm. Preconditions: both slices are already
    /// sorted descending by score (guaranteed by the beam applied after
    /// their cells were last built).
    #[allow(clippy::too_many_arguments)]
    fn cube_prune(
        chart: &mut Chart,
        left_ids: &[SuperCatId],
        right_ids: &[SuperCatId],
        rules: &dyn RuleEngine,
        scorer: &Scorer,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
        at_root: bool,
        k: usize,
    ) -> Vec<SuperCatId> {
        let l = left_ids.len();
        let r = right_ids.len();
        let mut track = vec![vec![false; r]; l];
        let mut pairs: VecDeque<(usize, usize)> = VecDeque::new();
        let mut queue: BinaryHeap<HeapEntry> = BinaryHeap::new();
        let mut kbest: Vec<SuperCatId> = Vec::with_capacity(k);

        pairs.push_back((0, 0));
        track[0][0] = true;

        while kbest.len() < k {
            while let Some((li, ri)) = pairs.pop_front() {
                let ids = Self::apply_rules_and_score(
                    chart, left_ids[li], right_ids[ri], rules, scorer, sentence, scratch, at_root,
                );
                if ids.is_empty() {
                    queue.push(HeapEntry {
                        score: FloatOrd(f64::NEG_INFINITY),
                        candidate: Candidate::Empty,
                        li,
                        ri,
                    });
                } else {
                    for id in ids {
                        let score = chart.arena().get(id).sort_score();
                        queue.push(HeapEntry {
                            score: FloatOrd(score),
                            candidate: Candidate::Real(id),
                            li,
                            ri,
                        });
                    }
                }
            }

            let Some(top) = queue.pop() else {
                break;
            };
            if let Candidate::Real(id) = top.candidate {
                kbest.push(id);
            }

            for (nli, nri) in [(top.li + 1, top.ri), (top.li, top.ri + 1)] {
                if nli < l && nri < r && !track[nli][nri] {
                    track[nli][nri] = true;
                    pairs.push_back((nli, nri));
                }
            }
        }

        kbest.sort_by(|&a, &b| {
            chart
                .arena()
                .get(b)
                .sort_score()
                .partial_cmp(&chart.arena().get(a).sort_score())
                .unwrap_or(Ordering::Equal)
        });
        kbest
    }
}
