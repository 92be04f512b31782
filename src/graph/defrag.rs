//! Mode transitions: in-place defragmentation, `finish` and `unfinish`.
//!
//! Defragmentation rewrites the scattered per-row circular lists into one
//! contiguous array grouped by row, in row order and preserving in-row list
//! order, using O(1) extra memory. The crux is the forwarding trick: when
//! the compaction cursor swaps live data out of its way, the vacated slot
//! keeps a forwarding link to wherever that data went, so every list pointer
//! still aimed at the old position can be redirected on dereference.

use crate::error::{GraphError, GraphResult};
use crate::graph::labels::EdgeLabel;
use crate::graph::{reserve_amortized, RowIndex, SparseGraph, NIL};
use crate::config::{MAX_EDGE_GROWTH, MIN_EDGE_CAPACITY};
use crate::timer::{start_phase, stop_phase, PhaseTimer};

/// Options controlling the dynamic-to-finished transition.
pub struct FinishOptions<'a> {
    /// Target orientation: `true` stores edges by source rows, `false`
    /// transposes first so rows index edge targets.
    pub store_by_rows: bool,

    /// Skip the shrink-to-fit pass. Set this when the graph will be
    /// `clear()`ed and refilled soon, to avoid reallocation thrashing.
    pub will_clear: bool,

    /// Optional instrumentation hook wrapped around the long phases.
    pub timer: Option<&'a dyn PhaseTimer>,
}

impl Default for FinishOptions<'_> {
    fn default() -> Self {
        Self {
            store_by_rows: true,
            will_clear: false,
            timer: None,
        }
    }
}

/// Compacts all circular row lists into contiguous per-row runs starting at
/// slot `lower`, leaving slots below `lower` untouched.
///
/// On return `tails[row]` has been rewritten to the CSR start offset of row
/// `row`, and the returned cursor is the total number of placed slots (the
/// closing offset). Slots at or above the returned cursor are garbage.
///
/// Invariant maintained throughout: slots below the cursor hold final data
/// whose `next` entry, if overwritten, is a forwarding pointer to the slot
/// that now holds whatever used to live there; slots at or above the cursor
/// hold live list elements whose `next` entries are list links (possibly
/// aimed at relocated slots, resolved by following forwards).
pub(crate) fn defragment<L: EdgeLabel>(
    tails: &mut [usize],
    next: &mut [usize],
    columns: &mut [usize],
    labels: &mut [L],
    lower: usize,
) -> usize {
    let mut cursor = lower;

    for row in 0..tails.len() {
        // Resolve the tail through any forwarding chain, then break the
        // circle so the row reads as a NIL-terminated linear list.
        let mut list = NIL;
        let mut tail = tails[row];
        if tail != NIL {
            while tail < cursor {
                tail = next[tail];
            }
            list = next[tail];
            next[tail] = NIL;
        }

        // The row's final CSR start offset.
        tails[row] = cursor;

        while list != NIL {
            // A head below the cursor was already moved away; only its
            // forwarding pointer remains. Chase it to the live slot.
            let mut slot = list;
            while slot < cursor {
                slot = next[slot];
            }
            list = next[slot];

            if slot != cursor {
                columns.swap(cursor, slot);
                labels.swap(cursor, slot);
                // The displaced element keeps its list link, and the vacated
                // slot forwards to the element's new home.
                next[slot] = next[cursor];
                next[cursor] = slot;
            }
            cursor += 1;
        }
    }

    cursor
}

impl<L: EdgeLabel> SparseGraph<L> {
    /// Freezes the graph into CSR form.
    ///
    /// If the requested orientation differs from the current one the graph
    /// is transposed first. The circular lists are then compacted in place,
    /// `num_edges` is re-established from the compacted count (duplicates
    /// merged at insertion time and edges unlinked by `remove_edges` no
    /// longer occupy slots), and unless `will_clear` is set the dynamic-only
    /// `next` array is freed and all arrays shrink to exact size.
    ///
    /// # Errors
    /// * [`GraphError::Finished`] if the graph is already finished.
    pub fn finish(&mut self, options: FinishOptions<'_>) -> GraphResult<()> {
        if self.is_finished() {
            return Err(GraphError::Finished);
        }

        if self.by_rows != options.store_by_rows {
            start_phase(options.timer, "Transposing graph");
            self.transpose()?;
            stop_phase(options.timer);
        }

        start_phase(options.timer, "Defragmenting graph");
        let Self { rows, next, columns, labels, .. } = &mut *self;
        let RowIndex::Tails(tails) = rows else {
            unreachable!("finish rejected a finished graph above");
        };

        let compacted = defragment(tails, next, columns, labels, 0);

        // The tail table becomes the offset table; append the closing entry
        // (capacity for it was reserved by add_nodes).
        let mut offsets = std::mem::take(tails);
        offsets.push(compacted);
        self.num_edges = compacted;

        if !options.will_clear {
            // Static mode has no use for the list links; release them and
            // trim everything else to exact size.
            self.next = Vec::new();
            self.columns.truncate(compacted);
            self.columns.shrink_to_fit();
            self.labels.truncate(compacted);
            self.labels.shrink_to_fit();
            offsets.shrink_to_fit();
        }

        self.rows = RowIndex::Offsets(offsets);
        stop_phase(options.timer);
        Ok(())
    }

    /// Thaws a finished graph back into dynamic mode, rebuilding the
    /// per-row circular lists from the CSR ranges.
    ///
    /// # Errors
    /// * [`GraphError::Unfinished`] if the graph is not finished.
    /// * [`GraphError::OutOfMemory`] if reallocating the list links fails.
    pub fn unfinish(&mut self) -> GraphResult<()> {
        let RowIndex::Offsets(offsets) = &mut self.rows else {
            return Err(GraphError::Unfinished);
        };

        // First pass: default linear chain next[e] = e + 1.
        self.next.clear();
        reserve_amortized(&mut self.next, self.num_edges, MIN_EDGE_CAPACITY, MAX_EDGE_GROWTH)?;
        self.next.extend(1..=self.num_edges);

        // Second pass: close each non-empty CSR range into a circle whose
        // cached tail is the range's last slot; empty rows get the sentinel.
        for row in 0..self.num_nodes {
            let start = offsets[row];
            let end = offsets[row + 1];
            if start == end {
                offsets[row] = NIL;
            } else {
                self.next[end - 1] = start;
                offsets[row] = end - 1;
            }
        }

        let mut tails = std::mem::take(offsets);
        tails.truncate(self.num_nodes);
        self.rows = RowIndex::Tails(tails);
        Ok(())
    }
}

#[cfg(test)]
mod test_defrag {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rustc_hash::FxHashSet;

    fn edge_triples<L: EdgeLabel>(g: &SparseGraph<L>) -> Vec<(usize, usize, L)> {
        let mut triples = Vec::new();
        g.traverse_all(|from, to, label| {
            triples.push((from, to, *label));
            false
        })
        .unwrap();
        triples.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        triples
    }

    /// The end-to-end scenario: a 5-node digraph finished by rows.
    #[test]
    fn test_finish_small_digraph() {
        let mut g = SparseGraph::<()>::new(false, false);
        g.add_nodes(5).unwrap();
        for (from, to) in [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)] {
            g.add_edge(from, to, ()).unwrap();
        }
        g.finish(FinishOptions::default()).unwrap();

        assert!(g.is_finished());
        assert!(g.is_by_rows());
        assert_eq!(g.num_edges(), 5);

        // Row 2 must read back in ascending destination order.
        let mut row2 = Vec::new();
        g.traverse_from(2, |from, to, _| {
            row2.push((from, to));
            false
        })
        .unwrap();
        assert_eq!(row2, vec![(2, 0), (2, 3)]);
    }

    #[test]
    fn test_finish_twice_rejected() {
        let mut g = SparseGraph::<()>::new(false, false);
        g.add_nodes(1).unwrap();
        g.finish(FinishOptions::default()).unwrap();
        assert_eq!(g.finish(FinishOptions::default()), Err(GraphError::Finished));
        assert_eq!(g.unfinish(), Ok(()));
        assert_eq!(g.unfinish(), Err(GraphError::Unfinished));
    }

    #[test]
    fn test_finish_empty_graph() {
        let mut g = SparseGraph::<()>::new(false, false);
        g.finish(FinishOptions::default()).unwrap();
        assert_eq!(g.num_edges(), 0);
        let view = g.export_finished().unwrap();
        assert_eq!(view.row_offsets, &[0]);
    }

    /// Rows left empty must collapse to zero-width CSR ranges.
    #[test]
    fn test_finish_with_empty_rows() {
        let mut g = SparseGraph::<()>::new(false, false);
        g.add_nodes(4).unwrap();
        g.add_edge(3, 0, ()).unwrap();
        g.finish(FinishOptions::default()).unwrap();

        let view = g.export_finished().unwrap();
        assert_eq!(view.row_offsets, &[0, 0, 0, 0, 1]);
        assert_eq!(view.column_index, &[0]);
    }

    #[test]
    fn test_finish_unfinish_round_trip() {
        for store_by_rows in [true, false] {
            let mut g = SparseGraph::<u64>::new(true, false);
            g.add_nodes(6).unwrap();
            let edges = [(0, 3), (3, 0), (1, 1), (2, 5), (2, 4), (5, 2), (4, 4)];
            for (i, (from, to)) in edges.iter().enumerate() {
                g.add_edge(*from, *to, i as u64).unwrap();
            }
            let before = edge_triples(&g);

            g.finish(FinishOptions { store_by_rows, ..Default::default() }).unwrap();
            assert_eq!(edge_triples(&g), before);

            g.unfinish().unwrap();
            assert!(!g.is_finished());
            assert_eq!(edge_triples(&g), before);

            // The thawed graph must accept further construction.
            g.add_edge(0, 5, 99).unwrap();
            assert_eq!(g.num_edges(), edges.len() + 1);
        }
    }

    /// Duplicate merging shrinks the edge count at insertion time; finish
    /// must report the merged count and keep per-row payload sums intact.
    #[test]
    fn test_finish_after_merging() {
        let mut g = SparseGraph::<u64>::new(false, true);
        g.add_nodes(3).unwrap();
        g.add_edge(0, 1, 1).unwrap();
        g.add_edge(0, 2, 1).unwrap();
        g.add_edge(0, 1, 1).unwrap();
        g.add_edge(0, 1, 1).unwrap();
        g.finish(FinishOptions::default()).unwrap();

        assert_eq!(g.num_edges(), 2);
        assert_eq!(edge_triples(&g), vec![(0, 1, 3), (0, 2, 1)]);
    }

    /// Randomized round trip: finish and unfinish must preserve the edge
    /// multiset for interleaved rows regardless of insertion order.
    #[test]
    fn test_round_trip_random() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10 {
            let nodes = rng.gen_range(2..40);
            let mut g = SparseGraph::<u64>::new(true, false);
            g.add_nodes(nodes).unwrap();

            let mut expected = Vec::new();
            for label in 0..rng.gen_range(1..200u64) {
                let from = rng.gen_range(0..nodes);
                let to = rng.gen_range(0..nodes);
                g.add_edge(from, to, label).unwrap();
                expected.push((from, to, label));
            }
            expected.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

            g.finish(FinishOptions::default()).unwrap();
            let mut finished = edge_triples(&g);
            finished.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
            assert_eq!(finished, expected);

            g.unfinish().unwrap();
            let mut thawed = edge_triples(&g);
            thawed.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
            assert_eq!(thawed, expected);
        }
    }

    /// The skip-trim finish keeps the graph queryable and `clear` must then
    /// hand back a construction-ready graph with its capacity intact.
    #[test]
    fn test_finish_will_clear_then_clear_reuse() {
        let mut g = SparseGraph::<u64>::new(false, false);
        g.add_nodes(5).unwrap();
        for (i, (from, to)) in [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)].iter().enumerate() {
            g.add_edge(*from, *to, i as u64).unwrap();
        }
        g.finish(FinishOptions { will_clear: true, ..Default::default() }).unwrap();

        assert!(g.is_finished());
        assert_eq!(g.num_edges(), 5);
        assert_eq!(
            edge_triples(&g),
            vec![(0, 1, 0), (1, 2, 1), (2, 0, 2), (2, 3, 3), (3, 4, 4)]
        );

        let capacity_before = g.report_memory_bytes();
        g.clear();
        assert!(!g.is_finished());
        assert_eq!(g.report_memory_bytes(), capacity_before);

        g.add_nodes(2).unwrap();
        g.add_edge(1, 0, 7).unwrap();
        assert_eq!(edge_triples(&g), vec![(1, 0, 7)]);
    }

    /// A merged duplicate leaves a stale slot past `num_edges`; after a
    /// skip-trim finish and a thaw, insertion must still work even though
    /// the edge arrays disagree on length.
    #[test]
    fn test_finish_will_clear_then_unfinish_resumes_construction() {
        let mut g = SparseGraph::<u64>::new(false, true);
        g.add_nodes(3).unwrap();
        g.add_edge(0, 1, 1).unwrap();
        assert_eq!(g.add_edge(0, 1, 2).unwrap(), true);
        assert_eq!(g.num_edges(), 1);

        g.finish(FinishOptions { will_clear: true, ..Default::default() }).unwrap();
        g.unfinish().unwrap();

        g.add_edge(1, 2, 5).unwrap();
        assert_eq!(g.num_edges(), 2);
        assert_eq!(edge_triples(&g), vec![(0, 1, 3), (1, 2, 5)]);

        // A fresh duplicate must still merge into the thawed lists.
        assert_eq!(g.add_edge(1, 2, 1).unwrap(), true);
        assert_eq!(edge_triples(&g), vec![(0, 1, 3), (1, 2, 6)]);
    }

    /// Defragmentation with a non-zero starting offset leaves the prefix
    /// slots untouched and places rows starting at that offset.
    #[test]
    fn test_defragment_respects_lower_bound() {
        // Slots 0..2 hold already-final data; row 0's circular list lives in
        // slots 2..4 with tail 3 (head 2, i.e. next[3] = 2, next[2] = 3).
        let mut tails = vec![3usize];
        let mut next = vec![NIL, NIL, 3, 2];
        let mut columns = vec![100usize, 101, 5, 7];
        let mut labels = vec![(); 4];

        let cursor = defragment(&mut tails, &mut next, &mut columns, &mut labels, 2);
        assert_eq!(cursor, 4);
        assert_eq!(tails, vec![2]);
        assert_eq!(columns, vec![100, 101, 5, 7]);
    }

    /// Heavier randomized check that defragmented rows keep their per-row
    /// destination sets.
    #[test]
    fn test_finish_preserves_row_sets() {
        let mut rng = StdRng::seed_from_u64(42);
        let nodes = 25;
        let mut g = SparseGraph::<()>::new(true, false);
        g.add_nodes(nodes).unwrap();

        let mut per_row: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); nodes];
        for _ in 0..300 {
            let from = rng.gen_range(0..nodes);
            let to = rng.gen_range(0..nodes);
            g.add_edge(from, to, ()).unwrap();
            per_row[from].insert(to);
        }

        g.finish(FinishOptions::default()).unwrap();
        for row in 0..nodes {
            let mut seen = FxHashSet::default();
            g.traverse_from(row, |_, to, _| {
                seen.insert(to);
                false
            })
            .unwrap();
            assert_eq!(seen, per_row[row], "row {} changed across finish", row);
        }
    }
}
