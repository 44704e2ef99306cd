use crate::sentence::Sentence;
use crate::supercat::SuperCategory;

/// A feature identifier, as looked up in [`crate::weights::Weights`].
pub type FeatureId = u32;

/// External collaborator (spec.md §6): emits feature IDs from a
/// supercategory in context. Each method fills `out` rather than
/// allocating, so a [`crate::driver::ParserDriver`] can reuse one `Vec`
/// scratch buffer across every node it scores, per spec.md §5/§9's
/// "scratch buffer reuse."
pub trait Features {
    fn collect_leaf_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn collect_unary_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn collect_binary_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
    fn collect_root_features(&self, node: &SuperCategory, sentence: &Sentence, out: &mut Vec<FeatureId>);
}

#[cfg(test)]
pub(crate) mod stub {
    //! Feature extractor used by this crate's own tests: every node emits
    //! exactly one feature ID, fixed per call site, so scoring tests can
    //! predict the exact weight contribution.
    use super::*;

    pub struct StubFeatures {
        pub leaf_feature: FeatureId,
        pub unary_feature: FeatureId,
        pub binary_feature: FeatureId,
        pub root_feature: FeatureId,
    }

    impl Default for StubFeatures {
        fn default() -> Self {
            Self {
                leaf_feature: 1,
                unary_feature: 2,
                binary_feature: 3,
                root_feature: 4,
            }
        }
    }

    impl Features for StubFeatures {
        fn collect_leaf_features(&self, _node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
            out.push(self.leaf_feature);
        }

        fn collect_unary_features(&self, _node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
            out.push(self.unary_feature);
        }

        fn collect_binary_features(&self, _node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
            out.push(self.binary_feature);
        }

        fn collect_root_features(&self, _node: &SuperCategory, _sentence: &Sentence, out: &mut Vec<FeatureId>) {
            out.push(self.root_feature);
        }
    }
}
