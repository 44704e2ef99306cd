use crate::chart::{Cell, Chart};
use crate::dependency::FilledDependency;
use crate::supercat::{SuperCatArena, SuperCatId};

/// Fallback decoder invoked when the root cell is empty (spec.md §4.6).
/// Greedy best-cover: repeatedly pick the widest-span non-empty cell within
/// the still-uncovered range (ties broken by highest score), then recurse
/// on the uncovered prefix and suffix. A total function whenever every leaf
/// has at least one supertag, since leaf cells always succeed.
///
/// Grounded on `forest.rs`'s root-seeking scan over cell 0 for a completed
/// span, adapted from "find the one complete derivation" to "greedily cover
/// the sentence with whatever partial derivations exist."
pub struct Skimmer;

impl Skimmer {
    /// Emits the concatenation of the chosen derivations' filled
    /// dependencies, in left-to-right order over `[0, n)`.
    pub fn decode(chart: &Chart, n: usize) -> Vec<FilledDependency> {
        Self::best_cover(chart, 0, n)
            .into_iter()
            .flat_map(|id| chart.arena().get(id).filled_deps.clone())
            .collect()
    }

    /// Same search as [`Skimmer::decode`], returning the chosen
    /// supercategories themselves rather than their flattened dependencies
    /// — exposed for callers (and tests) that want the derivations, not
    /// just the dependency concatenation.
    pub fn best_cover(chart: &Chart, start: usize, end: usize) -> Vec<SuperCatId> {
        if start >= end {
            return Vec::new();
        }

        let mut best: Option<(usize, usize, SuperCatId, f64)> = None;
        for position in start..end {
            for span in 1..=(end - position) {
                let cell = chart.cell(position, span);
                if cell.is_empty() {
                    continue;
                }
                let (id, score) = Self::best_in_cell(chart.arena(), cell);
                let replace = match best {
                    None => true,
                    Some((_, best_span, _, best_score)) => {
                        span > best_span || (span == best_span && score > best_score)
                    }
                };
                if replace {
                    best = Some((position, span, id, score));
                }
            }
        }

        match best {
            None => Vec::new(),
            Some((position, span, id, _)) => {
                let mut result = Self::best_cover(chart, start, position);
                result.push(id);
                result.extend(Self::best_cover(chart, position + span, end));
                result
            }
        }
    }

    fn best_in_cell(arena: &SuperCatArena, cell: &Cell) -> (SuperCatId, f64) {
        cell.iter()
            .map(|id| (id, arena.get(id).sort_score()))
            .reduce(|acc, candidate| if candidate.1 > acc.1 { candidate } else { acc })
            .expect("caller already checked the cell is non-empty")
    }
}
