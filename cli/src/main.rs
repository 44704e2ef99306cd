use std::env;
use std::process;

use ccgchart::config::ParserConfig;
use ccgchart::dependency::{Dependency, FilledDependency};
use ccgchart::driver::{Outcome, ParserDriver};
use ccgchart::features::{FeatureId, Features};
use ccgchart::rule_engine::{RuleEngine, RuleResult};
use ccgchart::sentence::{Sentence, WordEntry};
use ccgchart::supercat::{Category, Provenance, SuperCategory, VarFrame};
use ccgchart::weights::Weights;

fn usage(prog_name: &str) -> String {
    format!(
        r"
Usage: {} WORD [WORD...]

Parses a whitespace-tokenized sentence against a tiny hardcoded CCG
fragment (NP, S\NP, (S\NP)/NP) and prints the resulting derivation's
filled dependencies.

Options:
  -h, --help        Print this message
  --no-cube         Disable cube pruning (full enumeration)
  --beam N          Beam size (default 32)",
        prog_name
    )
}

/// A tiny slash-category grammar: `X/Y` (forward, consumes `Y` on the
/// right) and `X\Y` (backward, consumes `Y` on the left). Enough to show
/// `ParserDriver` wired up end to end without pulling in a real CCG rule
/// engine, which is out of scope per spec.md §1.
struct SlashRules;

impl RuleEngine for SlashRules {
    fn combine(&self, left: &SuperCategory, right: &SuperCategory, _sentence: &Sentence) -> Vec<RuleResult> {
        let mut out = Vec::new();

        if let Some((result, arg)) = left.category.as_str().split_once('/') {
            if arg == right.category.as_str() {
                out.push(application_result(left, right, result));
            }
        }

        if let Some((result, arg)) = right.category.as_str().split_once('\\') {
            if arg == left.category.as_str() {
                out.push(application_result(left, right, result));
            }
        }

        out
    }

    fn type_change(&self, _source: &SuperCategory) -> Vec<RuleResult> {
        Vec::new()
    }

    fn type_raise(&self, _source: &SuperCategory) -> Vec<RuleResult> {
        Vec::new()
    }
}

fn application_result(left: &SuperCategory, right: &SuperCategory, result: &str) -> RuleResult {
    let head = head_word(left);
    let filler = head_word(right);
    let dep = Dependency::new(0, head, 0, 0, (0, 0), 1.0);
    RuleResult {
        category: Category::new(result.to_string()),
        newly_filled_deps: vec![FilledDependency::fill(&dep, filler)],
        pending_deps: Vec::new(),
        var_frame: VarFrame::new(),
        rule_id: 0,
    }
}

fn head_word(node: &SuperCategory) -> u32 {
    match node.provenance {
        Provenance::Leaf { word } => word,
        _ => node.position + 1,
    }
}

/// Every node contributes one feature keyed by its category string, hashed
/// into a small range — enough to exercise the weight lookup without a
/// trained model.
struct CategoryFeatures;

impl Features for CategoryFeatures {
    fn collect_leaf_features(&self, node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
        out.push(category_feature(node));
    }

    fn collect_unary_features(&self, node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
        out.push(category_feature(node));
    }

    fn collect_binary_features(&self, node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
        out.push(category_feature(node));
    }

    fn collect_root_features(&self, _node: &SuperCategory, _sentence: &Sentence, _out: &mut Vec<FeatureId>) {}
}

fn category_feature(node: &SuperCategory) -> FeatureId {
    node.category.as_str().bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
}

/// Flat weight of `0.1` for every feature; no trained model is in scope for
/// this demo.
struct FlatWeights;

impl Weights for FlatWeights {
    fn weight(&self, _feature_id: FeatureId) -> f64 {
        0.1
    }

    fn dep_nn_weight(&self) -> f64 {
        0.0
    }
}

fn lexicon(word: &str) -> Option<Vec<(&'static str, f64)>> {
    match word {
        "i" | "she" | "it" => Some(vec![("NP", -0.1)]),
        "saw" => Some(vec![("(S\\NP)/NP", -0.1)]),
        "sleeps" => Some(vec![("S\\NP", -0.1)]),
        _ => None,
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let opts: Vec<String> = env::args().collect();
    let prog_name = opts[0].clone();

    let mut beam_size = 32usize;
    let mut cube_pruning = true;
    let mut words = Vec::new();

    let mut args = opts.into_iter().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage(&prog_name));
                return;
            }
            "--no-cube" => cube_pruning = false,
            "--beam" => {
                beam_size = args.next().and_then(|v| v.parse().ok()).unwrap_or(beam_size);
            }
            w => words.push(w.to_string()),
        }
    }

    if words.is_empty() {
        println!("{}", usage(&prog_name));
        process::exit(1);
    }

    let mut word_entries = Vec::new();
    for w in &words {
        let lower = w.to_lowercase();
        let Some(supertags) = lexicon(&lower) else {
            eprintln!("unknown word: {w}");
            process::exit(1);
        };
        word_entries.push(WordEntry {
            word: w.clone(),
            pos: "X".into(),
            supertags: supertags.into_iter().map(|(cat, p)| (Category::new(cat), p)).collect(),
        });
    }

    let sentence = Sentence::new(word_entries);

    let mut config = ParserConfig::default();
    config.beam_size = beam_size;
    config.cube_pruning = cube_pruning;
    if let Err(e) = config.validate() {
        eprintln!("invalid config: {e}");
        process::exit(1);
    }

    let mut driver = ParserDriver::new(config, Box::new(SlashRules), Box::new(CategoryFeatures), Box::new(FlatWeights));

    match driver.parse_sentence(&sentence) {
        Outcome::Parsed => {
            let root = driver.chart().root();
            if !root.is_empty() {
                let best = root.get(0).unwrap();
                println!("parsed: {}", driver.chart().arena().get(best).category);
                for dep in &driver.chart().arena().get(best).filled_deps {
                    println!("  dep: head={} filler={}", dep.head_index, dep.filler_index);
                }
            } else if let Some(deps) = driver.skimmed_dependencies() {
                println!("no full parse; skimmed:");
                for dep in deps {
                    println!("  dep: head={} filler={}", dep.head_index, dep.filler_index);
                }
            }
        }
        Outcome::Skipped(reason) => println!("skipped: {reason:?}"),
        Outcome::Exhausted => println!("exhausted"),
    }
}
