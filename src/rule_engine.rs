use crate::dependency::{Dependency, FilledDependency};
use crate::sentence::Sentence;
use crate::supercat::{Category, SuperCategory, VarFrame};

/// What applying a grammar rule to one or two input categories produces:
/// the resulting category, the dependencies this application step fills
/// (because the rule engine, given the children, knows which argument
/// position just met its head word), any new unfilled dependencies this
/// step introduces (e.g. fresh argument slots from type-raising), and the
/// variable bindings it contributes. Construction of the final
/// [`SuperCategory`] (scoring, arena allocation, span/filled-dep
/// bookkeeping) is the chart's job, not the rule engine's — the engine
/// only proposes results, per spec.md §1's framing of "binary combinatory
/// rules producing filled dependencies."
#[derive(Debug, Clone)]
pub struct RuleResult {
    pub category: Category,
    pub newly_filled_deps: Vec<FilledDependency>,
    pub pending_deps: Vec<Dependency>,
    pub var_frame: VarFrame,
    /// Identifies which grammar rule produced this result, for diagnostics
    /// and for [`Dependency::unary_rule_id`] bookkeeping; opaque to this
    /// crate.
    pub rule_id: u32,
}

/// External collaborator (spec.md §6): given one or two categories, tells
/// the chart what results are grammatically derivable, and what filled
/// dependencies that derivation would introduce. Never "throws" on the
/// absence of a rule — an empty `Vec` return means "no rule applies,"
/// matching spec.md's "never throw on absence of a rule." Grounded on
/// `rules::Grammar`'s `rules: HashMap<String, Vec<Rc<Rule>>>` lookup shape,
/// generalized from "own a rule table" to "declare the combine/unary
/// contract" a caller-supplied implementation fulfills however it likes
/// (table lookup, combinator logic, FFI into an external grammar).
pub trait RuleEngine {
    /// Binary combination of two categories at a split point. `sentence`
    /// is provided so combinatory rules that depend on lexical context
    /// (e.g. punctuation-sensitive rules) can consult it.
    fn combine(
        &self,
        left: &SuperCategory,
        right: &SuperCategory,
        sentence: &Sentence,
    ) -> Vec<RuleResult>;

    /// Type-changing unary rules (spec.md §4.4): applied before
    /// [`RuleEngine::type_raise`], never recursively on its own output
    /// within the same cell.
    fn type_change(&self, source: &SuperCategory) -> Vec<RuleResult>;

    /// Type-raising unary rules: applied after [`RuleEngine::type_change`].
    fn type_raise(&self, source: &SuperCategory) -> Vec<RuleResult>;
}
