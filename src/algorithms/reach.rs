//! Reachability over node sets: one-step forward/backward images for
//! fixpoint callers, and full breadth-first exploration from a single node.
//!
//! Node sets are plain `bool` membership slices of length `num_nodes`.

use crate::error::{GraphError, GraphResult};
use crate::graph::labels::EdgeLabel;
use crate::graph::{RowIndex, SparseGraph};

impl<L: EdgeLabel> SparseGraph<L> {
    /// Adds to `dest` every node reachable in one step from a node in
    /// `source`. Returns `true` if `dest` gained at least one new member.
    ///
    /// Requires finished mode. Depending on the orientation this runs as a
    /// row multiply (union each source row's destinations) or a column
    /// multiply (test each row for intersection with the source set); the
    /// logical result is identical.
    ///
    /// # Errors
    /// * [`GraphError::Unfinished`] if the graph is not finished.
    /// * [`GraphError::InvalidArgument`] if either set is shorter than the
    ///   node count.
    pub fn get_forward(&self, source: &[bool], dest: &mut [bool]) -> GraphResult<bool> {
        self.check_image_args(source, dest)?;
        let mut changed = false;

        if self.by_rows {
            // Row multiply: rows are sources.
            for row in 0..self.num_nodes {
                if !source[row] {
                    continue;
                }
                for slot in self.row_slots(row) {
                    let col = self.columns[slot];
                    if !dest[col] {
                        dest[col] = true;
                        changed = true;
                    }
                }
            }
        } else {
            // Column multiply: rows are targets, columns are sources.
            for row in 0..self.num_nodes {
                if dest[row] {
                    continue;
                }
                if self.row_slots(row).any(|slot| source[self.columns[slot]]) {
                    dest[row] = true;
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// Adds to `dest` every node with a one-step edge into a node of
    /// `target`. Returns `true` if `dest` gained at least one new member.
    ///
    /// # Errors
    /// Same conditions as [`SparseGraph::get_forward`].
    pub fn get_backward(&self, target: &[bool], dest: &mut [bool]) -> GraphResult<bool> {
        self.check_image_args(target, dest)?;
        let mut changed = false;

        if self.by_rows {
            // Rows are sources: a row joins if any destination is a target.
            for row in 0..self.num_nodes {
                if dest[row] {
                    continue;
                }
                if self.row_slots(row).any(|slot| target[self.columns[slot]]) {
                    dest[row] = true;
                    changed = true;
                }
            }
        } else {
            // Rows are targets: union the source columns of target rows.
            for row in 0..self.num_nodes {
                if !target[row] {
                    continue;
                }
                for slot in self.row_slots(row) {
                    let col = self.columns[slot];
                    if !dest[col] {
                        dest[col] = true;
                        changed = true;
                    }
                }
            }
        }
        Ok(changed)
    }

    fn check_image_args(&self, given: &[bool], dest: &[bool]) -> GraphResult<()> {
        if !matches!(self.rows, RowIndex::Offsets(_)) {
            return Err(GraphError::Unfinished);
        }
        if given.len() < self.num_nodes || dest.len() < self.num_nodes {
            return Err(GraphError::InvalidArgument(
                "node set shorter than the node count",
            ));
        }
        Ok(())
    }

    /// Breadth-first search from `start` along the stored row direction,
    /// marking every newly reached node in `reached` and appending the
    /// visit order to `queue`.
    ///
    /// Returns the number of newly reached nodes; `0` if `start` was
    /// already a member of `reached`. Works in both modes: the finished
    /// path iterates contiguous CSR ranges, the dynamic path walks the
    /// circular lists. The exploration direction follows the storage
    /// orientation (outgoing edges when stored by rows).
    ///
    /// # Errors
    /// * [`GraphError::BadIndex`] if `start` is out of range.
    /// * [`GraphError::InvalidArgument`] if `reached` is shorter than the
    ///   node count.
    pub fn get_reachable(
        &self,
        start: usize,
        reached: &mut [bool],
        queue: &mut Vec<usize>,
    ) -> GraphResult<usize> {
        if start >= self.num_nodes {
            return Err(GraphError::BadIndex(start));
        }
        if reached.len() < self.num_nodes {
            return Err(GraphError::InvalidArgument(
                "node set shorter than the node count",
            ));
        }
        if reached[start] {
            return Ok(0);
        }

        // The queue doubles as frontier and visit log: the caller may pass
        // a partially filled buffer, so only explore what this call added.
        let mut head = queue.len();
        queue.push(start);
        reached[start] = true;
        let mut count = 1;

        while head < queue.len() {
            let node = queue[head];
            head += 1;
            for slot in self.row_slots(node) {
                let col = self.columns[slot];
                if !reached[col] {
                    reached[col] = true;
                    queue.push(col);
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod test_reach {
    use super::*;
    use crate::graph::defrag::FinishOptions;

    fn chain(finished: bool) -> SparseGraph<()> {
        let mut g = SparseGraph::<()>::new(false, false);
        g.add_nodes(4).unwrap();
        for i in 0..3 {
            g.add_edge(i, i + 1, ()).unwrap();
        }
        if finished {
            g.finish(FinishOptions::default()).unwrap();
        }
        g
    }

    /// The chain 0 -> 1 -> 2 -> 3: everything is reachable from 0, only 3
    /// from 3. Both representations must agree.
    #[test]
    fn test_reachable_chain() {
        for finished in [false, true] {
            let g = chain(finished);

            let mut reached = vec![false; 4];
            let mut queue = Vec::new();
            assert_eq!(g.get_reachable(0, &mut reached, &mut queue).unwrap(), 4);
            assert_eq!(reached, vec![true; 4]);
            assert_eq!(queue, vec![0, 1, 2, 3]);

            // A second call from an already-reached node is a no-op.
            assert_eq!(g.get_reachable(2, &mut reached, &mut queue).unwrap(), 0);

            let mut reached = vec![false; 4];
            let mut queue = Vec::new();
            assert_eq!(g.get_reachable(3, &mut reached, &mut queue).unwrap(), 1);
            assert_eq!(queue, vec![3]);
        }
    }

    #[test]
    fn test_reachable_checks_arguments() {
        let g = chain(true);
        let mut reached = vec![false; 4];
        let mut queue = Vec::new();
        assert_eq!(
            g.get_reachable(9, &mut reached, &mut queue),
            Err(GraphError::BadIndex(9))
        );
        let mut short = vec![false; 2];
        assert!(matches!(
            g.get_reachable(0, &mut short, &mut queue),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    /// One-step images in both orientations, including the changed flag
    /// reaching its fixpoint.
    #[test]
    fn test_forward_backward_images() {
        for store_by_rows in [true, false] {
            let mut g = SparseGraph::<()>::new(false, false);
            g.add_nodes(5).unwrap();
            for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)] {
                g.add_edge(from, to, ()).unwrap();
            }
            g.finish(FinishOptions { store_by_rows, ..Default::default() }).unwrap();

            let mut source = vec![false; 5];
            source[0] = true;
            let mut image = vec![false; 5];
            assert!(g.get_forward(&source, &mut image).unwrap());
            assert_eq!(image, vec![false, true, true, false, false]);

            // Image of the image: {1, 2} steps to {3}.
            let mut second = vec![false; 5];
            assert!(g.get_forward(&image, &mut second).unwrap());
            assert_eq!(second, vec![false, false, false, true, false]);

            // Fixpoint: feeding the same sets again changes nothing.
            assert!(!g.get_forward(&source, &mut image).unwrap());

            let mut target = vec![false; 5];
            target[3] = true;
            let mut pre = vec![false; 5];
            assert!(g.get_backward(&target, &mut pre).unwrap());
            assert_eq!(pre, vec![false, true, true, false, false]);
        }
    }

    /// Fixpoint reachability via repeated get_forward matches BFS.
    #[test]
    fn test_forward_fixpoint_matches_bfs() {
        let mut g = SparseGraph::<()>::new(false, false);
        g.add_nodes(6).unwrap();
        for (from, to) in [(0, 1), (1, 2), (2, 0), (2, 3), (4, 5)] {
            g.add_edge(from, to, ()).unwrap();
        }
        g.finish(FinishOptions::default()).unwrap();

        let mut reached = vec![false; 6];
        reached[0] = true;
        loop {
            let frontier = reached.clone();
            if !g.get_forward(&frontier, &mut reached).unwrap() {
                break;
            }
        }

        let mut bfs = vec![false; 6];
        let mut queue = Vec::new();
        g.get_reachable(0, &mut bfs, &mut queue).unwrap();
        assert_eq!(reached, bfs);
    }

    #[test]
    fn test_images_require_finished_mode() {
        let g = chain(false);
        let source = vec![false; 4];
        let mut dest = vec![false; 4];
        assert_eq!(
            g.get_forward(&source, &mut dest),
            Err(GraphError::Unfinished)
        );
        assert_eq!(
            g.get_backward(&source, &mut dest),
            Err(GraphError::Unfinished)
        );
    }
}
