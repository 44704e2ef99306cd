use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ccgchart::chart::Chart;
use ccgchart::combiner::Combiner;
use ccgchart::dependency::{Dependency, FilledDependency};
use ccgchart::features::{FeatureId, Features};
use ccgchart::rule_engine::{RuleEngine, RuleResult};
use ccgchart::scorer::Scorer;
use ccgchart::sentence::{Sentence, WordEntry};
use ccgchart::supercat::{Category, Provenance, SuperCategory, VarFrame};
use ccgchart::weights::Weights;

/// Combines any two categories into a fixed `"S"` result with one
/// dependency — enough fan-out to exercise cube pruning's frontier without
/// needing a real grammar.
struct BenchRules;

impl RuleEngine for BenchRules {
    fn combine(&self, left: &SuperCategory, right: &SuperCategory, _sentence: &Sentence) -> Vec<RuleResult> {
        let head = match left.provenance {
            Provenance::Leaf { word } => word,
            _ => left.position + 1,
        };
        let filler = match right.provenance {
            Provenance::Leaf { word } => word,
            _ => right.position + 1,
        };
        let dep = Dependency::new(0, head, 0, 0, (0, 0), 1.0);
        vec![RuleResult {
            category: Category::new("S"),
            newly_filled_deps: vec![FilledDependency::fill(&dep, filler)],
            pending_deps: Vec::new(),
            var_frame: VarFrame::new(),
            rule_id: 0,
        }]
    }

    fn type_change(&self, _source: &SuperCategory) -> Vec<RuleResult> {
        Vec::new()
    }

    fn type_raise(&self, _source: &SuperCategory) -> Vec<RuleResult> {
        Vec::new()
    }
}

struct BenchFeatures;

impl Features for BenchFeatures {
    fn collect_leaf_features(&self, _node: &SuperCategory, _sentence: &Sentence, _out: &mut Vec<FeatureId>) {}
    fn collect_unary_features(&self, _node: &SuperCategory, _sentence: &Sentence, _out: &mut Vec<FeatureId>) {}
    fn collect_binary_features(&self, _node: &SuperCategory, _sentence: &Sentence, _out: &mut Vec<FeatureId>) {}
    fn collect_root_features(&self, _node: &SuperCategory, _sentence: &Sentence, _out: &mut Vec<FeatureId>) {}
}

struct BenchWeights;

impl Weights for BenchWeights {
    fn weight(&self, _feature_id: FeatureId) -> f64 {
        0.0
    }

    fn dep_nn_weight(&self) -> f64 {
        0.0
    }
}

fn build_cells(width: usize) -> Chart {
    let mut chart = Chart::new(1_000_000);
    chart.reset(2, 0);
    for i in 0..width {
        chart.add_no_dp(
            0,
            1,
            SuperCategory {
                category: Category::new("N"),
                filled_deps: Vec::new(),
                pending_deps: Vec::new(),
                provenance: Provenance::Leaf { word: 1 },
                var_frame: VarFrame::new(),
                position: 0,
                span: 1,
                log_p_score: Some(-(i as f64)),
                score: Some(-(i as f64)),
                log_dep_nn_score: None,
            },
        );
    }
    for i in 0..width {
        chart.add_no_dp(
            1,
            1,
            SuperCategory {
                category: Category::new("N"),
                filled_deps: Vec::new(),
                pending_deps: Vec::new(),
                provenance: Provenance::Leaf { word: 2 },
                var_frame: VarFrame::new(),
                position: 1,
                span: 1,
                log_p_score: Some(-(i as f64) - 0.5),
                score: Some(-(i as f64) - 0.5),
                log_dep_nn_score: None,
            },
        );
    }
    chart
}

fn sentence() -> Sentence {
    Sentence::new(vec![
        WordEntry {
            word: "a".into(),
            pos: "X".into(),
            supertags: Vec::new(),
        },
        WordEntry {
            word: "b".into(),
            pos: "X".into(),
            supertags: Vec::new(),
        },
    ])
}

fn combine(width: usize, cube_pruning: bool, beam_size: usize) {
    let mut chart = build_cells(width);
    let rules = BenchRules;
    let features = BenchFeatures;
    let weights = BenchWeights;
    let scorer = Scorer::new(&features, &weights, None, &ccgchart::weights::IgnoreNothing);
    let mut scratch = Vec::new();
    let sent = sentence();

    Combiner::combine_split(
        &mut chart, 0, 2, 0, 1, 1, 1, &rules, &scorer, &sent, &mut scratch, cube_pruning, beam_size, true,
    );
    if cube_pruning {
        Combiner::combine_pre_super_categories(&mut chart, 0, 2, beam_size);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let width = 50;
    let beam_size = 16;

    c.bench_function("combine plain 50x50", |b| {
        b.iter(|| combine(black_box(width), black_box(false), black_box(beam_size)))
    });

    c.bench_function("combine cube-pruned 50x50 -> top16", |b| {
        b.iter(|| combine(black_box(width), black_box(true), black_box(beam_size)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
