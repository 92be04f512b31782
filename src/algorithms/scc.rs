//! Terminal strongly-connected-component analysis.
//!
//! `compute_tsccs` runs three phases over a finished graph:
//!
//! 1. **Discovery** — Tarjan's algorithm with a non-recursive DFS (explicit
//!    stack and a Start/Neighbor/Finish state machine, so arbitrarily deep
//!    graphs cannot overflow the call stack), labeling every node with a
//!    1-based component id.
//! 2. **Terminal classification** — a component is terminal when no edge
//!    leaves it for a different component; nodes of transient components
//!    are relabeled 0.
//! 3. **Compaction** — surviving terminal component ids are renumbered into
//!    a dense `1..=k` range.
//!
//! The SCC partition of a graph equals that of its transpose, and phase 2
//! translates each physical edge back to its logical direction, so the
//! engine is correct in either storage orientation. It is simply faster
//! when stored by rows, where each row scan is one contiguous CSR range.

use crate::error::{GraphError, GraphResult};
use crate::graph::labels::EdgeLabel;
use crate::graph::{RowIndex, SparseGraph};
use crate::timer::{start_phase, stop_phase, PhaseTimer};

/// DFS state for the non-recursive implementation.
#[derive(Clone, Copy)]
enum Step {
    /// Assign the node's discovery index and push it on the Tarjan stack.
    Start,
    /// Process the neighbor at the given position within the node's row.
    Neighbor(usize),
    /// All neighbors done: fold child low-links, maybe pop a component.
    Finish,
}

/// Tests whether `w` is currently on the Tarjan stack.
///
/// With `conserve` set the explicit membership array is not allocated and
/// membership is re-derived instead: a discovered node stays on the stack
/// exactly until its component id is assigned.
fn on_tarjan_stack(
    conserve: bool,
    on_stack: &[bool],
    aux: &[usize],
    sccmap: &[usize],
    w: usize,
) -> bool {
    if conserve {
        aux[w] != 0 && sccmap[w] == 0
    } else {
        on_stack[w]
    }
}

impl<L: EdgeLabel> SparseGraph<L> {
    /// Computes the terminal strongly connected components of a finished
    /// graph and returns their count `k`.
    ///
    /// On return `sccmap[node]` is a dense id in `1..=k` for nodes inside a
    /// terminal component and `0` for nodes of transient components. `aux`
    /// is scratch for DFS discovery indices and holds no meaningful output.
    /// Both must be caller-allocated with at least `num_nodes` entries.
    ///
    /// `conserve_memory` trades one node-sized bookkeeping array for an
    /// extra comparison per stack-membership test during discovery.
    ///
    /// # Arguments
    ///
    /// * `timer` - Optional phase timer reporting the three phases
    /// * `conserve_memory` - Derive stack membership instead of storing it
    /// * `sccmap` - Receives the per-node component ids
    /// * `aux` - Scratch array of the same size
    ///
    /// # Errors
    /// * [`GraphError::Unfinished`] if the graph is not finished.
    /// * [`GraphError::InvalidArgument`] if `sccmap` or `aux` is shorter
    ///   than the node count.
    pub fn compute_tsccs(
        &self,
        timer: Option<&dyn PhaseTimer>,
        conserve_memory: bool,
        sccmap: &mut [usize],
        aux: &mut [usize],
    ) -> GraphResult<usize> {
        let RowIndex::Offsets(offsets) = &self.rows else {
            return Err(GraphError::Unfinished);
        };
        let n = self.num_nodes;
        if sccmap.len() < n || aux.len() < n {
            return Err(GraphError::InvalidArgument(
                "component arrays shorter than the node count",
            ));
        }
        if n == 0 {
            return Ok(0);
        }

        // Phase 1: discover SCCs, writing 1-based ids into sccmap.
        start_phase(timer, "SCC discovery");

        // aux[v] = discovery index + 1 (0 = unvisited); low[v] follows the
        // same shifted numbering.
        sccmap[..n].fill(0);
        aux[..n].fill(0);
        let mut low = vec![0usize; n];
        let mut on_stack = if conserve_memory {
            Vec::new()
        } else {
            vec![false; n]
        };
        let mut stack: Vec<usize> = Vec::new();
        let mut dfs: Vec<(usize, Step)> = Vec::new();
        let mut index = 0usize;
        let mut components = 0usize;

        // The outer loop restarts the DFS in every undiscovered region.
        for root in 0..n {
            if aux[root] != 0 {
                continue;
            }
            dfs.push((root, Step::Start));

            while let Some((v, step)) = dfs.pop() {
                match step {
                    Step::Start => {
                        index += 1;
                        aux[v] = index;
                        low[v] = index;
                        stack.push(v);
                        if !conserve_memory {
                            on_stack[v] = true;
                        }
                        dfs.push((v, Step::Neighbor(0)));
                    }

                    Step::Neighbor(pos) => {
                        let begin = offsets[v];
                        if begin + pos < offsets[v + 1] {
                            let w = self.columns[begin + pos];

                            // Schedule the next neighbor before descending.
                            dfs.push((v, Step::Neighbor(pos + 1)));

                            if aux[w] == 0 {
                                dfs.push((w, Step::Start));
                            } else if on_tarjan_stack(conserve_memory, &on_stack, aux, sccmap, w) {
                                // Back edge: the neighbor's discovery index
                                // bounds this node's low-link.
                                low[v] = low[v].min(aux[w]);
                            }
                        } else {
                            dfs.push((v, Step::Finish));
                        }
                    }

                    Step::Finish => {
                        // Children are complete now; fold the low-links of
                        // neighbors still on the stack.
                        for slot in offsets[v]..offsets[v + 1] {
                            let w = self.columns[slot];
                            if on_tarjan_stack(conserve_memory, &on_stack, aux, sccmap, w) {
                                low[v] = low[v].min(low[w]);
                            }
                        }

                        // Component root: pop the stack down to this node.
                        if low[v] == aux[v] {
                            components += 1;
                            loop {
                                let w = stack.pop().unwrap();
                                if !conserve_memory {
                                    on_stack[w] = false;
                                }
                                sccmap[w] = components;
                                if w == v {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }
        stop_phase(timer);

        // Phase 2: classify components; zero out the transient ones. Each
        // physical edge is read back in its logical direction first.
        start_phase(timer, "Terminal classification");
        let mut terminal = vec![true; components + 1];
        for row in 0..n {
            for slot in offsets[row]..offsets[row + 1] {
                let col = self.columns[slot];
                let (from, to) = if self.by_rows { (row, col) } else { (col, row) };
                if sccmap[from] != sccmap[to] {
                    terminal[sccmap[from]] = false;
                }
            }
        }
        for v in 0..n {
            if !terminal[sccmap[v]] {
                sccmap[v] = 0;
            }
        }
        stop_phase(timer);

        // Phase 3: compact surviving ids into dense 1..=k, numbered by first
        // appearance in node order.
        start_phase(timer, "Component compaction");
        let mut dense = vec![0usize; components + 1];
        let mut count = 0usize;
        for v in 0..n {
            let id = sccmap[v];
            if id != 0 {
                if dense[id] == 0 {
                    count += 1;
                    dense[id] = count;
                }
                sccmap[v] = dense[id];
            }
        }
        stop_phase(timer);

        Ok(count)
    }
}
