use tracing::trace;

use crate::supercat::{SuperCatArena, SuperCatId, SuperCategory};

/// Container of supercategories covering one `(position, span)` range.
/// Mirrors `earley::Chart`'s per-index `Vec<State>` slot, generalized from
/// a 1-D boundary index to a 2-D `(position, span)` cell, and from
/// "append, dedup by equality" to "append, then beam-prune by score."
///
/// `pre_super_categories` is the cube-pruning staging area (spec.md §4.2):
/// each split point's k-best results land here first; `commit_staged`
/// merges them into `super_categories`, which only cube pruning populates.
/// Plain-mode combination and unary expansion append straight into
/// `super_categories`.
#[derive(Debug, Default)]
pub struct Cell {
    super_categories: Vec<SuperCatId>,
    pre_super_categories: Vec<SuperCatId>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.super_categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.super_categories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SuperCatId> + '_ {
        self.super_categories.iter().copied()
    }

    pub fn get(&self, idx: usize) -> Option<SuperCatId> {
        self.super_categories.get(idx).copied()
    }

    /// Appends without duplicate detection — spec.md §4.7: "the beam is
    /// expected to deduplicate by whatever equivalence the cell requires."
    /// Cube pruning has no equivalent equivalence relation defined, so it
    /// isn't applied here; callers that need dedup do it before calling.
    pub fn add_no_dp(&mut self, ids: impl IntoIterator<Item = SuperCatId>) {
        self.super_categories.extend(ids);
    }

    pub fn stage(&mut self, ids: impl IntoIterator<Item = SuperCatId>) {
        self.pre_super_categories.extend(ids);
    }

    pub fn staged(&self) -> &[SuperCatId] {
        &self.pre_super_categories
    }

    pub fn clear_staged(&mut self) {
        self.pre_super_categories.clear();
    }

    /// Moves the cube-pruning staging area into the committed list, already
    /// capped and sorted by the caller (`Combiner::combine_pre_super_categories`).
    pub fn commit_staged(&mut self, ids: Vec<SuperCatId>) {
        self.super_categories.extend(ids);
        self.pre_super_categories.clear();
    }

    /// Sorts descending by score and truncates per spec.md §4.3. Returns
    /// the number of supercategories dropped, for caller-side bookkeeping
    /// of the chart-wide supercategory count.
    pub fn apply_beam(&mut self, arena: &SuperCatArena, max_count: usize, log_beta: f64) -> usize {
        let dropped = crate::pruning::apply_beam(arena, &mut self.super_categories, max_count, log_beta);
        if dropped > 0 {
            trace!(dropped, "beam pruned cell");
        }
        dropped
    }
}

/// Fixed-capacity triangular array addressed by `(position, span)`, `0 <=
/// position`, `position + span <= n`, `span >= 1`. Owns every
/// [`SuperCategory`] built while parsing the current sentence in a
/// [`SuperCatArena`]; cells hold only [`SuperCatId`] references into it.
///
/// Generalizes `earley::Chart`'s flat `Vec<Vec<State>>` (indexed by end
/// boundary only) into a 2-D triangular table, and borrows `forest::Forest`'s
/// "index by where a completed span starts" framing for how a span's
/// results are grouped.
#[derive(Debug)]
pub struct Chart {
    n: usize,
    /// `cells[position][span - 1]`; `span` ranges over `1..=n - position`.
    cells: Vec<Vec<Cell>>,
    arena: SuperCatArena,
    max_supercats: usize,
}

impl Chart {
    pub fn new(max_supercats: usize) -> Self {
        Self {
            n: 0,
            cells: Vec::new(),
            arena: SuperCatArena::new(),
            max_supercats,
        }
    }

    /// Resets the chart for a sentence of length `n`, dropping every
    /// previously-built supercategory. Pre-reserves each cell at
    /// `(i, j>1)` to `(j-1) * beam_size^2 * 2` per spec.md §4.7, covering
    /// combine-enumeration plus unary-expansion headroom.
    pub fn reset(&mut self, n: usize, beam_size: usize) {
        self.n = n;
        self.arena.clear();
        self.cells = (0..n)
            .map(|i| {
                (1..=(n - i))
                    .map(|j| {
                        let mut cell = Cell::new();
                        if j > 1 && beam_size > 0 {
                            let cap = (j - 1) * beam_size * beam_size * 2;
                            cell.super_categories = Vec::with_capacity(cap);
                        }
                        cell
                    })
                    .collect()
            })
            .collect();
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn cell(&self, position: usize, span: usize) -> &Cell {
        &self.cells[position][span - 1]
    }

    pub fn cell_mut(&mut self, position: usize, span: usize) -> &mut Cell {
        &mut self.cells[position][span - 1]
    }

    pub fn root(&self) -> &Cell {
        self.cell(0, self.n)
    }

    pub fn arena(&self) -> &SuperCatArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut SuperCatArena {
        &mut self.arena
    }

    pub fn total_supercats(&self) -> usize {
        self.arena.len()
    }

    pub fn max_supercats_exceeded(&self) -> bool {
        self.arena.len() > self.max_supercats
    }

    /// Allocates `node` in the arena and appends it to `cell(position,
    /// span)` without dedup, per spec.md §4.7's `addNoDP`. The triangular
    /// invariant (span/position bounds) is the caller's responsibility to
    /// maintain; debug-asserted here since a violation indicates a rule
    /// engine bug (spec.md §7's "structural violation").
    pub fn add_no_dp(&mut self, position: usize, span: usize, node: SuperCategory) -> SuperCatId {
        debug_assert_eq!(node.position as usize, position);
        debug_assert_eq!(node.span as usize, span);
        debug_assert!(position + span <= self.n);
        let id = self.arena.alloc(node);
        self.cell_mut(position, span).add_no_dp([id]);
        id
    }

    /// Applies beam/β pruning to `cell(position, span)`. A `Chart` method
    /// rather than a `Cell` one so the cell and the arena its scores live
    /// in (disjoint fields of `self`) can both be borrowed without an
    /// accessor method forcing a whole-`self` borrow on either side.
    pub fn apply_beam(&mut self, position: usize, span: usize, max_count: usize, log_beta: f64) -> usize {
        self.cells[position][span - 1].apply_beam(&self.arena, max_count, log_beta)
    }
}
