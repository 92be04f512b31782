//! Visitor-based edge enumeration, empty-row detection and the read-only
//! finished-form export.
//!
//! Visitors receive logical `(from, to, &label)` triples regardless of the
//! storage orientation; returning `true` stops the traversal early and the
//! enclosing call reports the short-circuit. Efficiency depends on
//! orientation: enumerating a node's outgoing edges is O(row length) when
//! stored by rows but O(V + E) when stored by columns (every row must be
//! scanned for matches), and symmetrically for incoming edges.

use crate::error::{GraphError, GraphResult};
use crate::graph::labels::EdgeLabel;
use crate::graph::{RowIndex, SparseGraph, NIL};

/// Read-only snapshot of a finished graph's CSR arrays.
///
/// The borrows alias the graph's internal storage, so the view is valid
/// exactly as long as the graph stays borrowed; any mutation first requires
/// dropping the view.
#[derive(Debug)]
pub struct FinishedView<'a, L: EdgeLabel> {
    /// True if rows index edge targets instead of sources.
    pub is_transposed: bool,

    /// `num_nodes + 1` offsets; row `r` owns `column_index[row_offsets[r]..row_offsets[r + 1]]`.
    pub row_offsets: &'a [usize],

    /// Destination node per edge (source, when transposed).
    pub column_index: &'a [usize],

    /// Payload per edge, parallel to `column_index`.
    pub labels: &'a [L],
}

impl<L: EdgeLabel> SparseGraph<L> {
    /// Enumerates the outgoing edges of `node`, i.e. all `(node, to)` pairs.
    ///
    /// Returns `Ok(true)` if the visitor stopped the traversal early.
    pub fn traverse_from<F>(&self, node: usize, mut visitor: F) -> GraphResult<bool>
    where
        F: FnMut(usize, usize, &L) -> bool,
    {
        if node >= self.num_nodes {
            return Err(GraphError::BadIndex(node));
        }
        if self.by_rows {
            self.scan_row(node, |row, col, label| visitor(row, col, label))
        } else {
            self.scan_matching(node, |row, col, label| visitor(col, row, label))
        }
    }

    /// Enumerates the incoming edges of `node`, i.e. all `(from, node)` pairs.
    ///
    /// Returns `Ok(true)` if the visitor stopped the traversal early.
    pub fn traverse_to<F>(&self, node: usize, mut visitor: F) -> GraphResult<bool>
    where
        F: FnMut(usize, usize, &L) -> bool,
    {
        if node >= self.num_nodes {
            return Err(GraphError::BadIndex(node));
        }
        if self.by_rows {
            self.scan_matching(node, |row, col, label| visitor(row, col, label))
        } else {
            self.scan_row(node, |row, col, label| visitor(col, row, label))
        }
    }

    /// Enumerates every edge of the graph.
    ///
    /// Returns `Ok(true)` if the visitor stopped the traversal early.
    pub fn traverse_all<F>(&self, mut visitor: F) -> GraphResult<bool>
    where
        F: FnMut(usize, usize, &L) -> bool,
    {
        for row in 0..self.num_nodes {
            for slot in self.row_slots(row) {
                let col = self.columns[slot];
                let (from, to) = if self.by_rows { (row, col) } else { (col, row) };
                if visitor(from, to, &self.labels[slot]) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Walks one physical row, passing raw `(row, column, label)` triples.
    fn scan_row<F>(&self, row: usize, mut emit: F) -> GraphResult<bool>
    where
        F: FnMut(usize, usize, &L) -> bool,
    {
        for slot in self.row_slots(row) {
            if emit(row, self.columns[slot], &self.labels[slot]) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Scans every physical row for edges whose column equals `col`,
    /// passing raw `(row, column, label)` triples. O(V + E).
    fn scan_matching<F>(&self, col: usize, mut emit: F) -> GraphResult<bool>
    where
        F: FnMut(usize, usize, &L) -> bool,
    {
        for row in 0..self.num_nodes {
            for slot in self.row_slots(row) {
                if self.columns[slot] == col
                    && emit(row, col, &self.labels[slot])
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Marks in `result` every node with no outgoing edges.
    ///
    /// `result` must hold at least `num_nodes` entries; entries beyond the
    /// node count are left untouched.
    pub fn no_outgoing_edges(&self, result: &mut [bool]) -> GraphResult<()> {
        if result.len() < self.num_nodes {
            return Err(GraphError::InvalidArgument(
                "result set shorter than the node count",
            ));
        }
        if self.by_rows {
            self.mark_empty_rows(result);
        } else {
            self.mark_absent_columns(result);
        }
        Ok(())
    }

    /// Marks in `result` every node with no incoming edges.
    pub fn no_incoming_edges(&self, result: &mut [bool]) -> GraphResult<()> {
        if result.len() < self.num_nodes {
            return Err(GraphError::InvalidArgument(
                "result set shorter than the node count",
            ));
        }
        if self.by_rows {
            self.mark_absent_columns(result);
        } else {
            self.mark_empty_rows(result);
        }
        Ok(())
    }

    /// Natural-direction scan: a row is empty when its offsets coincide
    /// (finished) or its tail is the sentinel (dynamic).
    fn mark_empty_rows(&self, result: &mut [bool]) {
        match &self.rows {
            RowIndex::Offsets(offsets) => {
                for row in 0..self.num_nodes {
                    result[row] = offsets[row] == offsets[row + 1];
                }
            }
            RowIndex::Tails(tails) => {
                for row in 0..self.num_nodes {
                    result[row] = tails[row] == NIL;
                }
            }
        }
    }

    /// Transposed-direction scan: mark everything, then clear each node
    /// that occurs as a column anywhere.
    fn mark_absent_columns(&self, result: &mut [bool]) {
        result[..self.num_nodes].fill(true);
        for row in 0..self.num_nodes {
            for slot in self.row_slots(row) {
                result[self.columns[slot]] = false;
            }
        }
    }

    /// Returns the read-only CSR view of a finished graph.
    ///
    /// # Errors
    /// * [`GraphError::Unfinished`] if the graph is still under construction.
    pub fn export_finished(&self) -> GraphResult<FinishedView<'_, L>> {
        let RowIndex::Offsets(offsets) = &self.rows else {
            return Err(GraphError::Unfinished);
        };
        Ok(FinishedView {
            is_transposed: !self.by_rows,
            row_offsets: offsets,
            column_index: &self.columns[..self.num_edges],
            labels: &self.labels[..self.num_edges],
        })
    }
}

#[cfg(test)]
mod test_traverse {
    use super::*;
    use crate::graph::defrag::FinishOptions;

    fn build_sample(finished: bool, store_by_rows: bool) -> SparseGraph<u64> {
        let mut g = SparseGraph::<u64>::new(false, false);
        g.add_nodes(5).unwrap();
        for (i, (from, to)) in [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)].iter().enumerate() {
            g.add_edge(*from, *to, i as u64).unwrap();
        }
        if finished {
            g.finish(FinishOptions { store_by_rows, ..Default::default() }).unwrap();
        } else if !store_by_rows {
            g.transpose().unwrap();
        }
        g
    }

    /// traverse_from and traverse_to agree with the logical edge set in all
    /// four mode/orientation combinations.
    #[test]
    fn test_traversal_is_orientation_independent() {
        for finished in [false, true] {
            for store_by_rows in [true, false] {
                let g = build_sample(finished, store_by_rows);

                let mut out2 = Vec::new();
                g.traverse_from(2, |from, to, _| {
                    assert_eq!(from, 2);
                    out2.push(to);
                    false
                })
                .unwrap();
                out2.sort_unstable();
                assert_eq!(out2, vec![0, 3], "finished={} rows={}", finished, store_by_rows);

                let mut in4 = Vec::new();
                g.traverse_to(4, |from, to, _| {
                    assert_eq!(to, 4);
                    in4.push(from);
                    false
                })
                .unwrap();
                assert_eq!(in4, vec![3]);

                let mut count = 0;
                g.traverse_all(|_, _, _| {
                    count += 1;
                    false
                })
                .unwrap();
                assert_eq!(count, 5);
            }
        }
    }

    #[test]
    fn test_traversal_short_circuits() {
        let g = build_sample(true, true);
        let mut seen = 0;
        let stopped = g
            .traverse_all(|_, _, _| {
                seen += 1;
                seen == 2
            })
            .unwrap();
        assert!(stopped);
        assert_eq!(seen, 2);

        let stopped = g.traverse_from(0, |_, _, _| true).unwrap();
        assert!(stopped);
    }

    #[test]
    fn test_traversal_bounds_checked() {
        let g = build_sample(false, true);
        assert_eq!(
            g.traverse_from(5, |_, _, _| false),
            Err(GraphError::BadIndex(5))
        );
        assert_eq!(
            g.traverse_to(99, |_, _, _| false),
            Err(GraphError::BadIndex(99))
        );
    }

    /// Node 4 is the only sink; every node has a predecessor (0's is 2).
    #[test]
    fn test_empty_row_detection() {
        for finished in [false, true] {
            for store_by_rows in [true, false] {
                let g = build_sample(finished, store_by_rows);

                let mut sinks = vec![false; 5];
                g.no_outgoing_edges(&mut sinks).unwrap();
                assert_eq!(sinks, vec![false, false, false, false, true]);

                let mut sources = vec![false; 5];
                g.no_incoming_edges(&mut sources).unwrap();
                assert_eq!(sources, vec![false, false, false, false, false]);
            }
        }
    }

    #[test]
    fn test_empty_row_result_length_checked() {
        let g = build_sample(false, true);
        let mut too_short = vec![false; 3];
        assert!(matches!(
            g.no_outgoing_edges(&mut too_short),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_export_finished_view() {
        let g = build_sample(true, true);
        let view = g.export_finished().unwrap();
        assert!(!view.is_transposed);
        assert_eq!(view.row_offsets, &[0, 1, 2, 4, 5, 5]);
        assert_eq!(view.column_index, &[1, 2, 0, 3, 4]);
        assert_eq!(view.labels.len(), 5);

        let dynamic = build_sample(false, true);
        assert_eq!(dynamic.export_finished().err(), Some(GraphError::Unfinished));
    }

    #[test]
    fn test_export_transposed_flag() {
        let g = build_sample(true, false);
        let view = g.export_finished().unwrap();
        assert!(view.is_transposed);
        // Rows now index targets: row 0 holds the sources of edges into 0.
        assert_eq!(view.row_offsets, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(view.column_index, &[2, 0, 1, 2, 3]);
    }
}
