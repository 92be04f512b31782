//! Tunable constants shared across the storage engine.

/// Smallest capacity installed when an edge array grows for the first time.
pub const MIN_EDGE_CAPACITY: usize = 16;

/// Ceiling on the number of edge slots added in a single growth step.
///
/// Capacity doubles until a step would exceed this chunk, after which growth
/// becomes linear. This bounds peak over-allocation on very large graphs
/// while keeping appends amortized O(1).
pub const MAX_EDGE_GROWTH: usize = 1024;

/// Smallest capacity installed when the row table grows for the first time.
pub const MIN_NODE_CAPACITY: usize = 8;

/// Ceiling on the number of row slots added in a single growth step.
pub const MAX_NODE_GROWTH: usize = 1024;

/// Buffer size used when streaming graph text files from disk.
pub const READ_BUFFER_SIZE: usize = 1 << 20;
