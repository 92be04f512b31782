//! Structural rewrites available in dynamic mode: transposition, node
//! renumbering and batch edge removal.

use crate::error::{GraphError, GraphResult};
use crate::graph::labels::EdgeLabel;
use crate::graph::{list_insert_sorted, RowIndex, SparseGraph, NIL};

impl<L: EdgeLabel> SparseGraph<L> {
    /// Swaps the roles of rows and columns in place, flipping the storage
    /// orientation.
    ///
    /// Every edge is walked once and re-inserted under its transposed key
    /// using the sorted non-merging policy, so duplicates present before the
    /// transpose remain distinct after it (merging is not reapplied), and
    /// every row comes out sorted by destination. O(V + E) time with one
    /// scratch row-table allocation.
    ///
    /// # Errors
    /// * [`GraphError::Finished`] if the graph is in finished mode.
    pub fn transpose(&mut self) -> GraphResult<()> {
        let num_nodes = self.num_nodes;
        let Self { rows, next, columns, .. } = &mut *self;
        let RowIndex::Tails(tails) = rows else {
            return Err(GraphError::Finished);
        };

        // Swap in a fresh all-empty row table; the old one becomes scratch.
        let mut fresh = Vec::new();
        fresh.try_reserve_exact(tails.capacity())
            .map_err(|_| GraphError::OutOfMemory)?;
        fresh.resize(num_nodes, NIL);
        let old_tails = std::mem::replace(tails, fresh);

        for old_row in 0..num_nodes {
            let tail = old_tails[old_row];
            if tail == NIL {
                continue;
            }

            // Linearize the old circular list, then re-thread each slot into
            // the row named by its old column, storing the old row as the
            // new column. Old rows are visited in ascending order, so each
            // re-insertion is an O(1) append.
            let head = next[tail];
            next[tail] = NIL;
            let mut slot = head;
            while slot != NIL {
                let rest = next[slot];
                let new_row = columns[slot];
                columns[slot] = old_row;
                list_insert_sorted(tails, next, columns, new_row, slot);
                slot = rest;
            }
        }

        self.by_rows = !self.by_rows;
        Ok(())
    }

    /// Relabels every node id through the bijection `perm`, where
    /// `perm[old_id] = new_id`.
    ///
    /// The row table is rearranged with in-place cycle-following swaps, then
    /// every stored column value is rewritten through `perm`. Column values
    /// may come out locally unsorted within a row; operations relying on
    /// sortedness (merged insertion, in particular) are unsafe until a
    /// subsequent `transpose` restores order. This follow-up cost is
    /// deliberate and not auto-corrected here.
    ///
    /// # Errors
    /// * [`GraphError::Finished`] if the graph is in finished mode.
    /// * [`GraphError::InvalidArgument`] if `perm` has the wrong length or
    ///   contains an out-of-range id.
    pub fn renumber(&mut self, perm: &[usize]) -> GraphResult<()> {
        let RowIndex::Tails(tails) = &mut self.rows else {
            return Err(GraphError::Finished);
        };
        if perm.len() != self.num_nodes {
            return Err(GraphError::InvalidArgument(
                "permutation length must equal the node count",
            ));
        }
        if perm.iter().any(|&id| id >= self.num_nodes) {
            return Err(GraphError::InvalidArgument(
                "permutation entry out of range",
            ));
        }

        // Apply the permutation to the row table in place: follow each
        // cycle, carrying the displaced entry forward, and mark visited
        // positions so no cycle is processed twice.
        let mut fixed = vec![false; self.num_nodes];
        for start in 0..self.num_nodes {
            if fixed[start] {
                continue;
            }
            fixed[start] = true;
            let mut carried = tails[start];
            let mut pos = perm[start];
            while pos != start {
                std::mem::swap(&mut carried, &mut tails[pos]);
                fixed[pos] = true;
                pos = perm[pos];
            }
            tails[start] = carried;
        }

        // Rewrite every destination through the permutation by walking each
        // row's circular list once.
        for row in 0..self.num_nodes {
            let tail = tails[row];
            if tail == NIL {
                continue;
            }
            let mut slot = tail;
            loop {
                slot = self.next[slot];
                self.columns[slot] = perm[self.columns[slot]];
                if slot == tail {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Removes every edge for which `visitor` returns `true`.
    ///
    /// The visitor receives logical `(from, to, label)` triples. Unlinked
    /// slots are simply abandoned; their capacity is reclaimed by the next
    /// `finish`, and `num_edges` is left unchanged until then (the slot at
    /// index `num_edges` stays reserved as the duplicate-scratch area).
    ///
    /// # Errors
    /// * [`GraphError::Finished`] if the graph is in finished mode.
    pub fn remove_edges<F>(&mut self, mut visitor: F) -> GraphResult<()>
    where
        F: FnMut(usize, usize, &L) -> bool,
    {
        let num_nodes = self.num_nodes;
        let by_rows = self.by_rows;
        let Self { rows, next, columns, labels, .. } = &mut *self;
        let RowIndex::Tails(tails) = rows else {
            return Err(GraphError::Finished);
        };

        for row in 0..num_nodes {
            let tail = tails[row];
            if tail == NIL {
                continue;
            }

            // Linearize so a forward-only scan with a running kept-tail
            // suffices, then close the survivors back into a circle.
            let head = next[tail];
            next[tail] = NIL;

            let mut kept_head = NIL;
            let mut kept_tail = NIL;
            let mut slot = head;
            while slot != NIL {
                let rest = next[slot];
                let (from, to) = if by_rows {
                    (row, columns[slot])
                } else {
                    (columns[slot], row)
                };
                if !visitor(from, to, &labels[slot]) {
                    if kept_head == NIL {
                        kept_head = slot;
                    } else {
                        next[kept_tail] = slot;
                    }
                    kept_tail = slot;
                }
                slot = rest;
            }

            if kept_head == NIL {
                tails[row] = NIL;
            } else {
                next[kept_tail] = kept_head;
                tails[row] = kept_tail;
            }
        }
        Ok(())
    }
}
