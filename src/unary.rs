use crate::chart::Chart;
use crate::features::FeatureId;
use crate::rule_engine::{RuleEngine, RuleResult};
use crate::scorer::Scorer;
use crate::sentence::Sentence;
use crate::supercat::{SuperCatId, SuperCategory};

/// Applies type-change then type-raise to a cell, per spec.md §4.4. Each
/// operation reads the cell's *currently committed* supercategories — a
/// snapshot taken before either pass starts appending — so neither rule is
/// applied recursively to its own output within the same cell, and
/// type-raise never sees type-change's output from a prior `expand` call
/// on a different cell. Never applied at the full-sentence root span; the
/// caller ([`crate::driver::ParserDriver`]) is responsible for skipping
/// that call.
///
/// Grounded on `earley::predictor`'s shape: read what's currently in the
/// chart at this position, ask the grammar what else follows from it,
/// append the results — generalized from "hypothesize a rule could start
/// here" to "apply a unary rule to what's already here."
pub struct UnaryExpander;

impl UnaryExpander {
    pub fn expand(
        chart: &mut Chart,
        position: usize,
        span: usize,
        rules: &dyn RuleEngine,
        scorer: &Scorer,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
    ) {
        Self::apply_pass(chart, position, span, scorer, sentence, scratch, |source| {
            rules.type_change(source)
        });
        Self::apply_pass(chart, position, span, scorer, sentence, scratch, |source| {
            rules.type_raise(source)
        });
    }

    fn apply_pass(
        chart: &mut Chart,
        position: usize,
        span: usize,
        scorer: &Scorer,
        sentence: &Sentence,
        scratch: &mut Vec<FeatureId>,
        rule: impl Fn(&SuperCategory) -> Vec<RuleResult>,
    ) {
        let source_ids: Vec<SuperCatId> = chart.cell(position, span).iter().collect();

        for source_id in source_ids {
            let source = chart.arena().get(source_id);
            let child_score = source.score.expect("unary source must already be scored");
            let results = rule(source);
            for result in results {
                let mut new_node = {
                    let source = chart.arena().get(source_id);
                    SuperCategory::new_unary(source_id, source, result)
                };
                scorer.calc_score_unary(&mut new_node, child_score, sentence, scratch);
                let new_id = chart.arena_mut().alloc(new_node);
                chart.cell_mut(position, span).add_no_dp([new_id]);
            }
        }
    }
}
