use tracing::{debug, warn};

use crate::chart::Chart;
use crate::combiner::Combiner;
use crate::config::ParserConfig;
use crate::dependency::FilledDependency;
use crate::features::{FeatureId, Features};
use crate::rule_engine::RuleEngine;
use crate::scorer::Scorer;
use crate::sentence::Sentence;
use crate::skimmer::Skimmer;
use crate::supercat::{Provenance, SuperCategory, VarFrame};
use crate::unary::UnaryExpander;
use crate::weights::{DepNeuralScorer, DependencyIgnorePolicy, IgnoreNothing, Weights};

/// Result of [`ParserDriver::parse_sentence`], per spec.md §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The fill completed. The root cell may still be empty; callers that
    /// care should check [`ParserDriver::skimmed_dependencies`] — see the
    /// root-empty resolution in this crate's design notes.
    Parsed,
    Skipped(SkipReason),
    /// A `preParse` hook returned `false`; no chart work was done.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MaxWords,
    MaxSuperCats,
}

/// CKY outer loop, pre-/post-parse hooks, root detection, skimmer fallback
/// (spec.md §4.1). Grounded on `earley.rs::parse_chart`'s outer loop shape
/// (seed, iterate positions, dispatch per state), generalized from a 1-D
/// Earley sweep to the CKY width/position/split loop spec.md describes, and
/// on `cli/src/bin/cli.rs`'s driver-wires-grammar-and-drives-parse shape for
/// how the external collaborators get threaded through.
///
/// Single-threaded (spec.md §5): one instance is not safe for concurrent
/// `parse_sentence` calls, since the chart and scratch buffers are reused
/// across cells within a call and across calls between sentences.
pub struct ParserDriver {
    config: ParserConfig,
    rules: Box<dyn RuleEngine>,
    features: Box<dyn Features>,
    weights: Box<dyn Weights>,
    dep_nn: Option<Box<dyn DepNeuralScorer>>,
    ignore_policy: Box<dyn DependencyIgnorePolicy>,
    chart: Chart,
    /// Reused across every node scored in a call, per spec.md §5/§9's
    /// "scratch buffer reuse" — cleared by [`Scorer`] at each use, never
    /// reallocated mid-sentence.
    feature_scratch: Vec<FeatureId>,
    pre_parse: Option<Box<dyn FnMut() -> bool>>,
    post_parse: Option<Box<dyn FnMut()>>,
    skimmed: Option<Vec<FilledDependency>>,
}

impl ParserDriver {
    pub fn new(
        config: ParserConfig,
        rules: Box<dyn RuleEngine>,
        features: Box<dyn Features>,
        weights: Box<dyn Weights>,
    ) -> Self {
        let max_supercats = config.max_supercats;
        Self {
            config,
            rules,
            features,
            weights,
            dep_nn: None,
            ignore_policy: Box::new(IgnoreNothing),
            chart: Chart::new(max_supercats),
            feature_scratch: Vec::new(),
            pre_parse: None,
            post_parse: None,
            skimmed: None,
        }
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn set_ignore_policy(&mut self, policy: Box<dyn DependencyIgnorePolicy>) {
        self.ignore_policy = policy;
    }

    pub fn set_pre_parse_hook(&mut self, hook: Box<dyn FnMut() -> bool>) {
        self.pre_parse = Some(hook);
    }

    pub fn set_post_parse_hook(&mut self, hook: Box<dyn FnMut()>) {
        self.post_parse = Some(hook);
    }

    /// Attaches (or replaces) the neural dependency scorer. Per spec.md
    /// §9's open question, this is unconditional: the original `initDepNN`
    /// only re-instantiated the model when one was already attached, which
    /// is treated here as a bug and not reproduced — this always replaces
    /// whatever was attached, including attaching the first one.
    pub fn attach_dep_nn(&mut self, model: Box<dyn DepNeuralScorer>) {
        self.dep_nn = Some(model);
    }

    /// Dependencies emitted by the skimmer on the most recent
    /// [`ParserDriver::parse_sentence`] call, if the root cell was empty.
    /// `None` if the root was non-empty (a real derivation exists) or no
    /// sentence has been parsed yet.
    pub fn skimmed_dependencies(&self) -> Option<&[FilledDependency]> {
        self.skimmed.as_deref()
    }

    pub fn parse_sentence(&mut self, sentence: &Sentence) -> Outcome {
        self.skimmed = None;

        if sentence.len() > self.config.max_words {
            warn!(words = sentence.len(), max = self.config.max_words, "sentence exceeds max_words");
            return Outcome::Skipped(SkipReason::MaxWords);
        }

        let n = sentence.len();
        self.chart.reset(n, self.config.beam_size);

        for position in 0..n {
            self.load_leaf_raw(position, sentence);
            if self.chart.max_supercats_exceeded() {
                warn!(position, "max_supercats exceeded during leaf load");
                return Outcome::Skipped(SkipReason::MaxSuperCats);
            }
        }

        if let Some(pre) = self.pre_parse.as_mut() {
            if !pre() {
                return Outcome::Exhausted;
            }
        }

        if n == 0 {
            if let Some(post) = self.post_parse.as_mut() {
                post();
            }
            return Outcome::Parsed;
        }

        let scorer = Scorer::new(
            self.features.as_ref(),
            self.weights.as_ref(),
            self.dep_nn.as_deref(),
            self.ignore_policy.as_ref(),
        );

        for position in 0..n {
            self.score_leaf_cell(position, sentence, &scorer);
            UnaryExpander::expand(
                &mut self.chart,
                position,
                1,
                self.rules.as_ref(),
                &scorer,
                sentence,
                &mut self.feature_scratch,
            );
            self.chart.apply_beam(position, 1, 0, self.config.beta);
            if self.chart.max_supercats_exceeded() {
                warn!(position, "max_supercats exceeded during leaves pass");
                return Outcome::Skipped(SkipReason::MaxSuperCats);
            }
        }

        for span in 2..=n {
            for position in 0..=(n - span) {
                let at_root = span == n;
                for split in 1..span {
                    Combiner::combine_split(
                        &mut self.chart,
                        position,
                        span,
                        position,
                        split,
                        position + split,
                        span - split,
                        self.rules.as_ref(),
                        &scorer,
                        sentence,
                        &mut self.feature_scratch,
                        self.config.cube_pruning,
                        self.config.beam_size,
                        at_root,
                    );
                }

                if self.config.cube_pruning {
                    Combiner::combine_pre_super_categories(&mut self.chart, position, span, self.config.beam_size);
                }

                if span < n {
                    UnaryExpander::expand(
                        &mut self.chart,
                        position,
                        span,
                        self.rules.as_ref(),
                        &scorer,
                        sentence,
                        &mut self.feature_scratch,
                    );
                }

                self.chart.apply_beam(position, span, self.config.beam_size, self.config.beta);

                if self.chart.max_supercats_exceeded() {
                    warn!(position, span, "max_supercats exceeded during fill");
                    return Outcome::Skipped(SkipReason::MaxSuperCats);
                }
            }
        }

        if self.chart.root().is_empty() {
            debug!("root cell empty, invoking skimmer");
            self.skimmed = Some(Skimmer::decode(&self.chart, n));
        }

        if let Some(post) = self.post_parse.as_mut() {
            post();
        }

        Outcome::Parsed
    }

    /// Populates `cell(position, 1)` from `sentence.word(position)`'s
    /// candidate supertags, filtered by the loader's own tighter β
    /// (`config.lexical_beta`, distinct from the cell β used everywhere
    /// else), per spec.md §4.1 step 2. Runs unconditionally before the
    /// `preParse` hook, and leaves every node unscored: a caller that
    /// inspects the chart after an `Exhausted` outcome still sees these
    /// raw leaves, not an empty chart.
    fn load_leaf_raw(&mut self, position: usize, sentence: &Sentence) {
        let word = sentence.word(position);
        if word.supertags.is_empty() {
            return;
        }

        let max_log_p = word
            .supertags
            .iter()
            .map(|(_, log_p)| *log_p)
            .fold(f64::NEG_INFINITY, f64::max);
        let cutoff = max_log_p + self.config.lexical_beta;

        for (category, log_p) in &word.supertags {
            if *log_p < cutoff {
                continue;
            }
            let node = SuperCategory {
                category: category.clone(),
                filled_deps: Vec::new(),
                pending_deps: Vec::new(),
                provenance: Provenance::Leaf {
                    word: position as u32 + 1,
                },
                var_frame: VarFrame::new(),
                position: position as u32,
                span: 1,
                log_p_score: Some(*log_p),
                score: None,
                log_dep_nn_score: None,
            };
            self.chart.add_no_dp(position, 1, node);
        }
    }

    /// Scores every raw leaf already populated in `cell(position, 1)` by
    /// [`ParserDriver::load_leaf_raw`], per spec.md §4.1 step 4's
    /// "score every leaf (`calcScoreLeaf`)". Runs after the `preParse`
    /// hook, as the first half of the leaves pass.
    fn score_leaf_cell(&mut self, position: usize, sentence: &Sentence, scorer: &Scorer) {
        let ids: Vec<_> = self.chart.cell(position, 1).iter().collect();
        for id in ids {
            let node = self.chart.arena_mut().get_mut(id);
            scorer.calc_score_leaf(node, sentence, &mut self.feature_scratch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stub::StubFeatures;
    use crate::rule_engine::stub::StubRuleEngine;
    use crate::sentence::WordEntry;
    use crate::supercat::Category;
    use crate::weights::stub::StubWeights;

    fn driver(config: ParserConfig) -> ParserDriver {
        ParserDriver::new(
            config,
            Box::new(StubRuleEngine::new()),
            Box::new(StubFeatures::default()),
            Box::new(StubWeights::default()),
        )
    }

    /// Scenario 1 (spec.md §8): single-word sentence, two candidate
    /// supertags S1 (logP=-1), S2 (logP=-3), lexical beta = -1. After the
    /// leaves pass, cell(0,1) contains only S1.
    #[test]
    fn lexical_beta_filters_low_probability_supertags() {
        let mut config = ParserConfig::default();
        config.lexical_beta = -1.0;
        config.cube_pruning = false;
        let mut driver = driver(config);

        let sentence = Sentence::new(vec![WordEntry {
            word: "dog".into(),
            pos: "N".into(),
            supertags: vec![(Category::new("S1"), -1.0), (Category::new("S2"), -3.0)],
        }]);

        let outcome = driver.parse_sentence(&sentence);
        assert_eq!(outcome, Outcome::Parsed);
        assert_eq!(driver.chart().cell(0, 1).len(), 1);
        let id = driver.chart().cell(0, 1).get(0).unwrap();
        assert_eq!(driver.chart().arena().get(id).category.as_str(), "S1");
    }

    /// Scenario 4 (spec.md §8): a small MAX_SUPERCATS cap is exceeded
    /// during leaf loading; the parser returns Skipped(MaxSuperCats) and
    /// the chart stays in a valid, clearable state.
    #[test]
    fn max_supercats_tripwire_stops_the_fill() {
        let mut config = ParserConfig::default();
        config.max_supercats = 2;
        config.lexical_beta = 0.0;
        let mut driver = driver(config);

        let sentence = Sentence::new(vec![WordEntry {
            word: "dog".into(),
            pos: "N".into(),
            supertags: vec![
                (Category::new("S1"), -1.0),
                (Category::new("S2"), -1.0),
                (Category::new("S3"), -1.0),
            ],
        }]);

        let outcome = driver.parse_sentence(&sentence);
        assert_eq!(outcome, Outcome::Skipped(SkipReason::MaxSuperCats));

        // chart stays usable: resetting for the next sentence clears it.
        driver.chart();
        let sentence2 = Sentence::new(vec![WordEntry {
            word: "dog".into(),
            pos: "N".into(),
            supertags: vec![(Category::new("S1"), -1.0)],
        }]);
        let mut config2 = ParserConfig::default();
        config2.max_supercats = 2;
        let mut driver2 = driver(config2);
        assert_eq!(driver2.parse_sentence(&sentence2), Outcome::Parsed);
    }

    #[test]
    fn oversized_sentence_is_skipped_without_touching_the_chart() {
        let mut config = ParserConfig::default();
        config.max_words = 1;
        let mut driver = driver(config);

        let sentence = Sentence::new(vec![
            WordEntry {
                word: "a".into(),
                pos: "N".into(),
                supertags: vec![(Category::new("N"), -1.0)],
            },
            WordEntry {
                word: "b".into(),
                pos: "N".into(),
                supertags: vec![(Category::new("N"), -1.0)],
            },
        ]);

        let outcome = driver.parse_sentence(&sentence);
        assert_eq!(outcome, Outcome::Skipped(SkipReason::MaxWords));
    }

    /// Step 2 (raw leaf load) runs unconditionally before step 3's
    /// `preParse` check, per spec.md §4.1 — a `preParse` abort still leaves
    /// the raw, unscored leaves in the chart rather than an empty one.
    #[test]
    fn pre_parse_hook_returning_false_exhausts_but_leaves_raw_leaves() {
        let mut config = ParserConfig::default();
        config.cube_pruning = false;
        let mut driver = driver(config);
        driver.set_pre_parse_hook(Box::new(|| false));

        let sentence = Sentence::new(vec![WordEntry {
            word: "dog".into(),
            pos: "N".into(),
            supertags: vec![(Category::new("S1"), -1.0)],
        }]);

        let outcome = driver.parse_sentence(&sentence);
        assert_eq!(outcome, Outcome::Exhausted);

        assert_eq!(driver.chart().cell(0, 1).len(), 1);
        let id = driver.chart().cell(0, 1).get(0).unwrap();
        assert!(driver.chart().arena().get(id).score.is_none());
    }

    #[test]
    fn post_parse_hook_runs_once_on_a_completed_parse() {
        use std::cell::Cell as StdCell;
        use std::rc::Rc;

        let mut config = ParserConfig::default();
        config.cube_pruning = false;
        let mut driver = driver(config);

        let ran = Rc::new(StdCell::new(false));
        let ran_clone = Rc::clone(&ran);
        driver.set_post_parse_hook(Box::new(move || ran_clone.set(true)));

        let sentence = Sentence::new(vec![WordEntry {
            word: "dog".into(),
            pos: "N".into(),
            supertags: vec![(Category::new("S1"), -1.0)],
        }]);

        let outcome = driver.parse_sentence(&sentence);
        assert_eq!(outcome, Outcome::Parsed);
        assert!(ran.get());
    }

    #[test]
    fn root_empty_triggers_skimmer() {
        let mut config = ParserConfig::default();
        config.cube_pruning = false;
        let mut driver = ParserDriver::new(
            config,
            Box::new(StubRuleEngine::refusing_combination_at(1)),
            Box::new(StubFeatures::default()),
            Box::new(StubWeights::default()),
        );

        let sentence = Sentence::new(vec![
            WordEntry {
                word: "a".into(),
                pos: "N".into(),
                supertags: vec![(Category::new("N"), -1.0)],
            },
            WordEntry {
                word: "b".into(),
                pos: "N".into(),
                supertags: vec![(Category::new("N"), -1.0)],
            },
        ]);

        let outcome = driver.parse_sentence(&sentence);
        assert_eq!(outcome, Outcome::Parsed);
        assert!(driver.chart().root().is_empty());
        assert!(driver.skimmed_dependencies().is_some());
    }
}
