use crate::dependency::FilledDependency;
use crate::features::FeatureId;
use crate::sentence::Sentence;

/// External collaborator: a keyed lookup from feature ID to linear weight,
/// plus the neural-dependency mixing coefficient.
pub trait Weights {
    fn weight(&self, feature_id: FeatureId) -> f64;

    /// `w_depNN` from spec.md §4.5: the scalar coefficient the scorer
    /// multiplies `log_dep_nn_score` by.
    fn dep_nn_weight(&self) -> f64;
}

/// Attributes describing one filled dependency, passed to
/// [`DepNeuralScorer::predict_soft`]. Field names follow spec.md §4.5's
/// `(head, dep, slot, headPOS, depPOS, ...)` list.
#[derive(Debug, Clone)]
pub struct DepAttrs {
    pub head_word: String,
    pub head_pos: String,
    pub dep_word: String,
    pub dep_pos: String,
    pub slot: u32,
}

/// Optional collaborator: a learned neural dependency scorer. Absent means
/// the scorer's neural term is skipped entirely (spec.md §4.5's "gracefully
/// no-ops when absent").
pub trait DepNeuralScorer {
    /// Returns a probability in `(0, 1]`; the caller takes its `ln`.
    fn predict_soft(&self, attrs: &DepAttrs) -> f64;
}

/// External collaborator: decides whether a filled dependency should be
/// excluded from feature/neural scoring (spec.md §4.5, §6).
pub trait DependencyIgnorePolicy {
    fn ignore(&self, dep: &FilledDependency, sentence: &Sentence) -> bool;
}

/// Default policy: ignore nothing.
pub struct IgnoreNothing;

impl DependencyIgnorePolicy for IgnoreNothing {
    fn ignore(&self, _dep: &FilledDependency, _sentence: &Sentence) -> bool {
        false
    }
}
