//! Dual-mode sparse directed graph storage.
//!
//! A [`SparseGraph`] lives in one of two representations:
//!
//! * **Dynamic** — per-row circular singly-linked lists threaded through a
//!   flat `next` array, with the row table caching each row's *tail* slot.
//!   Supports incremental `add_nodes`/`add_edge` with optional duplicate
//!   merging, batch edge removal, transposition and renumbering.
//! * **Finished** — CSR form: the row table holds `num_nodes + 1` offsets
//!   into a contiguous `columns`/`labels` pair. Compact, query-optimized,
//!   and the required form for the set-based reachability and SCC engines.
//!
//! `finish` converts dynamic to finished in place (optionally transposing
//! first), `unfinish` converts back, and `clear` resets the graph for reuse
//! while retaining allocated capacity.
//!
//! The `stored_by_rows` orientation flag decides whether physical rows are
//! edge sources (natural) or edge targets (transposed). All public entry
//! points take logical `(from, to)` pairs and translate internally.

use crate::config::{MAX_EDGE_GROWTH, MAX_NODE_GROWTH, MIN_EDGE_CAPACITY, MIN_NODE_CAPACITY};
use crate::error::{GraphError, GraphResult};
use crate::graph::labels::EdgeLabel;

pub mod defrag;
pub mod labels;
pub mod transform;
pub mod traverse;

/// Sentinel for "no slot": terminates linear lists and marks empty rows.
pub(crate) const NIL: usize = usize::MAX;

/// Row table of the graph; the active variant *is* the storage mode.
#[derive(Debug)]
pub(crate) enum RowIndex {
    /// Dynamic mode: `tails[row]` is the tail slot of the row's circular
    /// list, or [`NIL`] if the row is empty.
    Tails(Vec<usize>),

    /// Finished mode: `offsets` has `num_nodes + 1` entries and row `r`
    /// owns the contiguous slot range `offsets[r]..offsets[r + 1]`.
    Offsets(Vec<usize>),
}

/// Sparse directed graph with dense integer node ids and `L`-labeled edges.
///
/// Nodes are identified by their index in `[0, num_nodes)` and are only ever
/// appended (or wiped wholesale by `clear`). Edges are identified by their
/// slot index in the parallel `columns`/`labels` arrays.
#[derive(Debug)]
pub struct SparseGraph<L: EdgeLabel = ()> {
    /// Row table; also the mode discriminant.
    pub(crate) rows: RowIndex,

    /// Intrusive list links, one per edge slot. Meaningful in dynamic mode;
    /// freed by a trimming `finish` and rebuilt by `unfinish`/`clear`.
    pub(crate) next: Vec<usize>,

    /// Destination node per edge slot (or source, when stored by columns).
    pub(crate) columns: Vec<usize>,

    /// Payload per edge slot; zero-sized for unlabeled graphs.
    pub(crate) labels: Vec<L>,

    pub(crate) num_nodes: usize,
    pub(crate) num_edges: usize,

    /// Orientation: `true` if physical rows are edge sources.
    pub(crate) by_rows: bool,

    keep_self_loops: bool,
    merge_duplicates: bool,
}

impl<L: EdgeLabel> SparseGraph<L> {
    /// Creates an empty graph in dynamic mode, stored by rows.
    ///
    /// # Arguments
    /// * `keep_self_loops` - If false, `add_edge(n, n, ..)` is a silent no-op.
    /// * `merge_duplicates` - If true, per-row lists deduplicate on
    ///   destination, combining payloads via [`EdgeLabel::merge`]; if false,
    ///   duplicate edges are stored side by side (multigraph).
    pub fn new(keep_self_loops: bool, merge_duplicates: bool) -> Self {
        Self {
            rows: RowIndex::Tails(Vec::new()),
            next: Vec::new(),
            columns: Vec::new(),
            labels: Vec::new(),
            num_nodes: 0,
            num_edges: 0,
            by_rows: true,
            keep_self_loops,
            merge_duplicates,
        }
    }

    /// Number of nodes currently in the graph.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of edges currently counted.
    ///
    /// After `remove_edges` this still includes unlinked slots; the count is
    /// re-established from the compacted layout by the next `finish`.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// True once `finish` has converted the graph to CSR form.
    pub fn is_finished(&self) -> bool {
        matches!(self.rows, RowIndex::Offsets(_))
    }

    /// True if physical rows are edge sources (the natural orientation).
    pub fn is_by_rows(&self) -> bool {
        self.by_rows
    }

    /// True if duplicate destinations are merged on insertion.
    pub fn merges_duplicates(&self) -> bool {
        self.merge_duplicates
    }

    /// Appends a single node and returns its id.
    pub fn add_node(&mut self) -> GraphResult<usize> {
        self.add_nodes(1)?;
        Ok(self.num_nodes - 1)
    }

    /// Appends `count` nodes with empty rows at the high end of the id space.
    ///
    /// # Errors
    /// * [`GraphError::Finished`] if the graph is in finished mode.
    /// * [`GraphError::OutOfMemory`] if growing the row table fails; the
    ///   graph must then be treated as unusable.
    pub fn add_nodes(&mut self, count: usize) -> GraphResult<()> {
        let RowIndex::Tails(tails) = &mut self.rows else {
            return Err(GraphError::Finished);
        };

        // Reserve one slot beyond the row count so the finishing pass can
        // append the closing CSR offset without reallocating.
        let total = self.num_nodes + count + 1;
        reserve_amortized(tails, total, MIN_NODE_CAPACITY, MAX_NODE_GROWTH)?;

        tails.resize(self.num_nodes + count, NIL);
        self.num_nodes += count;
        Ok(())
    }

    /// Inserts the edge `from -> to` carrying `label`.
    ///
    /// Returns `Ok(true)` when the edge was recognized as a duplicate of an
    /// existing one (only possible with duplicate merging enabled); the
    /// payloads are then combined and no new slot is consumed. Returns
    /// `Ok(false)` when a new edge was stored, and also when a disallowed
    /// self-loop was silently dropped.
    ///
    /// # Errors
    /// * [`GraphError::Finished`] if the graph is in finished mode.
    /// * [`GraphError::BadIndex`] if `from` or `to` is out of range.
    /// * [`GraphError::OutOfMemory`] if growing the edge arrays fails.
    pub fn add_edge(&mut self, from: usize, to: usize, label: L) -> GraphResult<bool> {
        if from == to && !self.keep_self_loops {
            return Ok(false);
        }
        if from >= self.num_nodes {
            return Err(GraphError::BadIndex(from));
        }
        if to >= self.num_nodes {
            return Err(GraphError::BadIndex(to));
        }

        let RowIndex::Tails(tails) = &mut self.rows else {
            return Err(GraphError::Finished);
        };

        // The physical row dimension is whichever orientation is active.
        let (row, col) = if self.by_rows { (from, to) } else { (to, from) };

        // Grow all three edge arrays before touching any list structure, so
        // an allocation failure leaves no partially linked edge behind.
        let slot = self.num_edges;
        reserve_amortized(&mut self.columns, slot + 1, MIN_EDGE_CAPACITY, MAX_EDGE_GROWTH)?;
        reserve_amortized(&mut self.labels, slot + 1, MIN_EDGE_CAPACITY, MAX_EDGE_GROWTH)?;
        reserve_amortized(&mut self.next, slot + 1, MIN_EDGE_CAPACITY, MAX_EDGE_GROWTH)?;

        // The arrays may disagree on length: a `will_clear` finish skips the
        // truncation pass, so after `unfinish` the rebuilt `next` holds
        // exactly `num_edges` entries while `columns`/`labels` may still
        // carry stale slots beyond. Grow each array on its own.
        if slot == self.columns.len() {
            self.columns.push(col);
        } else {
            // Reuse the scratch slot abandoned by the previous duplicate.
            self.columns[slot] = col;
        }
        if slot == self.labels.len() {
            self.labels.push(label);
        } else {
            self.labels[slot] = label;
        }
        if slot == self.next.len() {
            self.next.push(NIL);
        }

        let duplicate = if self.merge_duplicates {
            list_insert_merged(tails, &mut self.next, &self.columns, &mut self.labels, row, slot)
        } else {
            list_insert_sorted(tails, &mut self.next, &self.columns, row, slot);
            false
        };

        if !duplicate {
            self.num_edges += 1;
        }
        Ok(duplicate)
    }

    /// Resets the graph to an empty dynamic state, retaining all array
    /// capacities so a subsequent rebuild does not thrash the allocator.
    pub fn clear(&mut self) {
        match &mut self.rows {
            RowIndex::Tails(tails) => tails.clear(),
            RowIndex::Offsets(offsets) => {
                // Thaw back to construction mode, reusing the offset buffer
                // as the new (empty) tail table.
                let mut tails = std::mem::take(offsets);
                tails.clear();
                self.rows = RowIndex::Tails(tails);
            }
        }
        self.next.clear();
        self.columns.clear();
        self.labels.clear();
        self.num_nodes = 0;
        self.num_edges = 0;
    }

    /// Total bytes currently allocated by the graph's arrays.
    pub fn report_memory_bytes(&self) -> usize {
        let row_bytes = match &self.rows {
            RowIndex::Tails(tails) => tails.capacity(),
            RowIndex::Offsets(offsets) => offsets.capacity(),
        } * std::mem::size_of::<usize>();

        row_bytes
            + self.next.capacity() * std::mem::size_of::<usize>()
            + self.columns.capacity() * std::mem::size_of::<usize>()
            + self.labels.capacity() * std::mem::size_of::<L>()
    }

    /// Iterates the live edge slots of physical row `row`, in list order
    /// (ascending destination for rows built by sorted insertion).
    ///
    /// Works in both modes; `row` must be in range.
    pub(crate) fn row_slots(&self, row: usize) -> RowSlots<'_> {
        match &self.rows {
            RowIndex::Offsets(offsets) => RowSlots::Range(offsets[row]..offsets[row + 1]),
            RowIndex::Tails(tails) => {
                let tail = tails[row];
                if tail == NIL {
                    RowSlots::Range(0..0)
                } else {
                    RowSlots::List {
                        next: &self.next,
                        cur: self.next[tail],
                        tail,
                        done: false,
                    }
                }
            }
        }
    }
}

/// Iterator over the edge slots of one physical row.
pub(crate) enum RowSlots<'a> {
    Range(std::ops::Range<usize>),
    List {
        next: &'a [usize],
        cur: usize,
        tail: usize,
        done: bool,
    },
}

impl Iterator for RowSlots<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            RowSlots::Range(range) => range.next(),
            RowSlots::List { next, cur, tail, done } => {
                if *done {
                    return None;
                }
                let slot = *cur;
                if slot == *tail {
                    *done = true;
                } else {
                    *cur = next[slot];
                }
                Some(slot)
            }
        }
    }
}

/// Grows `vec`'s capacity to hold at least `total` elements, doubling from
/// `floor` but never adding more than `chunk` slots in one step.
///
/// Allocation failures surface as [`GraphError::OutOfMemory`] instead of
/// aborting the process.
pub(crate) fn reserve_amortized<T>(
    vec: &mut Vec<T>,
    total: usize,
    floor: usize,
    chunk: usize,
) -> GraphResult<()> {
    if total <= vec.capacity() {
        return Ok(());
    }
    let mut target = vec.capacity().max(floor);
    while target < total {
        target += target.min(chunk);
    }
    vec.try_reserve_exact(target - vec.len())
        .map_err(|_| GraphError::OutOfMemory)
}

/// Inserts `slot` into row `row`'s circular list, kept sorted ascending by
/// `columns[slot]`. Duplicates are inserted after their equals (the newest
/// occupies the position). Used for non-merging graphs and for transposition.
///
/// The tail cache makes the in-order append case O(1): when the new
/// destination is >= the tail's, the slot becomes the new tail directly.
pub(crate) fn list_insert_sorted(
    tails: &mut [usize],
    next: &mut [usize],
    columns: &[usize],
    row: usize,
    slot: usize,
) {
    let dest = columns[slot];
    let tail = tails[row];

    // Empty row: the slot forms a one-element circle.
    if tail == NIL {
        next[slot] = slot;
        tails[row] = slot;
        return;
    }

    // Append case: new largest destination becomes the tail.
    if columns[tail] <= dest {
        next[slot] = next[tail];
        next[tail] = slot;
        tails[row] = slot;
        return;
    }

    // Out-of-order case: scan from the head. Terminates before wrapping
    // because the tail's destination is known to be greater than `dest`.
    let mut prev = tail;
    let mut cur = next[tail];
    while columns[cur] <= dest {
        prev = cur;
        cur = next[cur];
    }
    next[slot] = cur;
    next[prev] = slot;
}

/// Inserts `slot` into row `row`'s sorted circular list, merging into an
/// existing edge when the destination is already present.
///
/// Returns `true` if the slot was a duplicate: its payload has been folded
/// into the stored edge and the slot itself is left unlinked for the caller
/// to abandon.
pub(crate) fn list_insert_merged<L: EdgeLabel>(
    tails: &mut [usize],
    next: &mut [usize],
    columns: &[usize],
    labels: &mut [L],
    row: usize,
    slot: usize,
) -> bool {
    let dest = columns[slot];
    let tail = tails[row];

    if tail == NIL {
        next[slot] = slot;
        tails[row] = slot;
        return false;
    }

    // O(1) checks against the cached tail: in-order appends and repeated
    // insertions of the current largest destination are the common case.
    if columns[tail] == dest {
        let incoming = labels[slot];
        labels[tail].merge(incoming);
        return true;
    }
    if columns[tail] < dest {
        next[slot] = next[tail];
        next[tail] = slot;
        tails[row] = slot;
        return false;
    }

    let mut prev = tail;
    let mut cur = next[tail];
    while columns[cur] < dest {
        prev = cur;
        cur = next[cur];
    }
    if columns[cur] == dest {
        let incoming = labels[slot];
        labels[cur].merge(incoming);
        return true;
    }
    next[slot] = cur;
    next[prev] = slot;
    false
}
