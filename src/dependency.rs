use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Identifier for a grammatical relation type (e.g. CCG's `(S\NP)/NP`'s
/// subject slot), opaque to this crate — assigned and interpreted by the
/// rule engine.
pub type RelId = u32;

/// Identifier for a word position in the sentence, 1-indexed so that `0`
/// can mean "unfilled" is never a valid head — see [`Dependency::new`].
pub type WordIndex = u32;

/// A grammar variable standing for an as-yet-unfilled dependency slot.
pub type Var = u32;

/// A left-or-right span bound, used to record where in the sentence a
/// dependency's filler is permitted to come from.
pub type LRange = (u32, u32);

/// An unfilled grammatical relation awaiting a filler word.
///
/// Totally ordered lexicographically over `(rel_id, head_index, var, lrange,
/// unary_rule_id)`; hashed over the same keys, `conj_factor` excluded, so
/// that `a.cmp(b) == Ordering::Equal` iff `a == b` iff `hash(a) == hash(b)`.
#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub rel_id: RelId,
    head_index: WordIndex,
    pub var: Var,
    pub unary_rule_id: u32,
    pub lrange: LRange,
    /// Conjunction scaling factor; excluded from equality/ordering/hash per
    /// spec — two dependencies that differ only in `conj_factor` compare
    /// equal, since the factor is a scoring weight, not an identity field.
    pub conj_factor: f64,
}

impl Dependency {
    /// `head_index` must be non-zero; a zero head index is a structural
    /// violation in the rule engine (spec.md §7) and is rejected here with
    /// a panic rather than propagated as a recoverable error.
    pub fn new(
        rel_id: RelId,
        head_index: WordIndex,
        var: Var,
        unary_rule_id: u32,
        lrange: LRange,
        conj_factor: f64,
    ) -> Self {
        assert!(
            head_index != 0,
            "dependency head_index must be non-zero (rule engine structural violation)"
        );
        Self {
            rel_id,
            head_index,
            var,
            unary_rule_id,
            lrange,
            conj_factor,
        }
    }

    pub fn head_index(&self) -> WordIndex {
        self.head_index
    }

    fn ordering_key(&self) -> (RelId, WordIndex, Var, LRange, u32) {
        (
            self.rel_id,
            self.head_index,
            self.var,
            self.lrange,
            self.unary_rule_id,
        )
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.ordering_key() == other.ordering_key()
    }
}

impl Eq for Dependency {}

impl PartialOrd for Dependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }
}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordering_key().hash(state);
    }
}

/// A [`Dependency`] whose variable slot has been unified with a concrete
/// word position: "filler" in CCG terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilledDependency {
    pub rel_id: RelId,
    pub head_index: WordIndex,
    pub filler_index: WordIndex,
    pub unary_rule_id: u32,
}

impl FilledDependency {
    pub fn fill(dep: &Dependency, filler_index: WordIndex) -> Self {
        assert!(filler_index != 0, "filler_index must be non-zero");
        Self {
            rel_id: dep.rel_id,
            head_index: dep.head_index(),
            filler_index,
            unary_rule_id: dep.unary_rule_id,
        }
    }
}
