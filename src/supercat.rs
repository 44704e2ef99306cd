use std::fmt;
use std::rc::Rc;

use crate::dependency::{Dependency, FilledDependency, Var, WordIndex};
use crate::rule_engine::RuleResult;

/// A grammatical category, opaque to this crate beyond identity and display
/// — the rule engine is the sole authority on what categories exist and how
/// they combine. Cheap to clone (an `Rc<str>` under the hood), mirroring
/// `rules::Symbol`'s `{ name: String }` wrapper in the teacher, but
/// reference-counted since categories are shared across many arena nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(Rc<str>);

impl Category {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binds a node's grammar variables to concrete word positions as they
/// become known, tracking which dependency variables are filled by which
/// head/filler words. Generalizes the co-indexed `#1`/`#2` tags of the
/// teacher's feature-structure unification (`featurestructure/node.rs`)
/// from "unify two nodes' tag sets" to "record a var's resolved word
/// index," since CCG dependency-filling is a narrower problem than full
/// feature unification. Backed by `rustc_hash::FxHashMap` rather than
/// `std::collections::HashMap` — var IDs are small dense integers, the
/// same shape pcfg_tool uses an `FxHashMap` for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarFrame {
    bindings: rustc_hash::FxHashMap<Var, WordIndex>,
}

impl VarFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: Var, word: WordIndex) {
        self.bindings.insert(var, word);
    }

    pub fn resolve(&self, var: Var) -> Option<WordIndex> {
        self.bindings.get(&var).copied()
    }

    pub fn merged_with(&self, other: &VarFrame) -> VarFrame {
        let mut merged = self.clone();
        for (&var, &word) in &other.bindings {
            merged.bind(var, word);
        }
        merged
    }
}

/// How a node was built, and from what. A leaf has no children; a unary
/// node has one; a binary node has two. Kept as its own enum (rather than
/// `Option<SuperCatId>` pairs inline on the struct) so a match on "how was
/// this built" is exhaustive at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Leaf { word: WordIndex },
    Unary { child: SuperCatId },
    Binary { left: SuperCatId, right: SuperCatId },
}

/// Index of a [`SuperCategory`] inside a [`SuperCatArena`]. Newtype so that
/// indices from different arenas can't be confused, and so arena accesses
/// read as intentional lookups rather than raw `usize` indexing — the same
/// role `featurestructure/node.rs`'s `NodeIdx` plays for its `NodeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuperCatId(u32);

impl SuperCatId {
    fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the parse forest: a category carrying the filled dependencies
/// produced at this point, its children (if any), and its accumulated
/// score. Immutable in structure once inserted into the arena; `score` and
/// `log_dep_nn_score` start unset and are assigned exactly once by the
/// [`crate::scorer::Scorer`].
#[derive(Debug, Clone)]
pub struct SuperCategory {
    pub category: Category,
    /// Every filled dependency dominated by this node: its children's
    /// filled dependencies plus whatever this node's own rule application
    /// newly filled.
    pub filled_deps: Vec<FilledDependency>,
    /// Unfilled dependencies still awaiting a filler, carried forward from
    /// the rule engine's result for this node.
    pub pending_deps: Vec<Dependency>,
    pub provenance: Provenance,
    pub var_frame: VarFrame,
    /// Position, span of the sentence range this node covers: `[position,
    /// position + span)`.
    pub position: u32,
    pub span: u32,
    /// Lexical prior, set only for leaves (`Provenance::Leaf`); `None` for
    /// unary/binary nodes per spec.md §3.
    pub log_p_score: Option<f64>,
    /// Cumulative score; `None` until [`crate::scorer::Scorer`] visits this
    /// node exactly once.
    pub score: Option<f64>,
    pub log_dep_nn_score: Option<f64>,
}

impl SuperCategory {
    pub fn is_leaf(&self) -> bool {
        matches!(self.provenance, Provenance::Leaf { .. })
    }

    /// Score for sorting/pruning purposes; unscored nodes sort as `-inf` so
    /// they never survive a beam, rather than panicking mid-sort.
    pub fn sort_score(&self) -> f64 {
        self.score.unwrap_or(f64::NEG_INFINITY)
    }

    /// Builds the unary child of `source`, per a [`RuleResult`] from
    /// [`crate::rule_engine::RuleEngine::type_change`]/`type_raise`.
    /// Unscored: the caller runs [`crate::scorer::Scorer::calc_score_unary`]
    /// afterwards.
    pub fn new_unary(source_id: SuperCatId, source: &SuperCategory, result: RuleResult) -> Self {
        let mut filled_deps = source.filled_deps.clone();
        filled_deps.extend(result.newly_filled_deps);
        Self {
            category: result.category,
            filled_deps,
            pending_deps: result.pending_deps,
            provenance: Provenance::Unary { child: source_id },
            var_frame: source.var_frame.merged_with(&result.var_frame),
            position: source.position,
            span: source.span,
            log_p_score: None,
            score: None,
            log_dep_nn_score: None,
        }
    }

    /// Builds the binary parent of `left`/`right`, per a [`RuleResult`]
    /// from [`crate::rule_engine::RuleEngine::combine`]. Unscored: the
    /// caller runs [`crate::scorer::Scorer::calc_score_binary`] afterwards.
    pub fn new_binary(
        left_id: SuperCatId,
        left: &SuperCategory,
        right_id: SuperCatId,
        right: &SuperCategory,
        result: RuleResult,
    ) -> Self {
        let mut filled_deps = left.filled_deps.clone();
        filled_deps.extend(right.filled_deps.iter().copied());
        filled_deps.extend(result.newly_filled_deps);
        Self {
            category: result.category,
            filled_deps,
            pending_deps: result.pending_deps,
            provenance: Provenance::Binary {
                left: left_id,
                right: right_id,
            },
            var_frame: left.var_frame.merged_with(&right.var_frame).merged_with(&result.var_frame),
            position: left.position,
            span: left.span + right.span,
            log_p_score: None,
            score: None,
            log_dep_nn_score: None,
        }
    }
}

/// Owning store of every [`SuperCategory`] built while parsing one
/// sentence. The chart is the sole owner; children are [`SuperCatId`]
/// indices valid only until the next [`SuperCatArena::clear`], mirroring
/// spec.md §3's "destroyed when the chart is cleared" lifecycle and §9's
/// call to re-architect the original's GC'd reference graph as arena
/// ownership. No cycles can form: a node's children must already exist in
/// the arena (lower indices) before the node referencing them is pushed.
#[derive(Debug, Default)]
pub struct SuperCatArena {
    nodes: Vec<SuperCategory>,
}

impl SuperCatArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn alloc(&mut self, node: SuperCategory) -> SuperCatId {
        let id = SuperCatId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: SuperCatId) -> &SuperCategory {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: SuperCatId) -> &mut SuperCategory {
        &mut self.nodes[id.index()]
    }
}
