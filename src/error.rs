//! Error taxonomy for the graph engine.
//!
//! Every failure is raised at the point of detection and propagated with `?`;
//! nothing is swallowed internally. The documented no-op behaviors
//! (self-loop suppression, duplicate merging) are successful boolean results,
//! not errors.

use thiserror::Error;

/// Failure conditions surfaced by graph operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The requested capability is not supported by this engine.
    #[error("operation not implemented")]
    NotImplemented,

    /// A node id was outside `[0, num_nodes)`.
    #[error("node index {0} out of range")]
    BadIndex(usize),

    /// An allocation failed while growing internal storage. The graph should
    /// be treated as no longer safely mutable; no partial edge was linked in.
    #[error("allocation failure while growing graph storage")]
    OutOfMemory,

    /// A construction-time mutator was called on a finished graph.
    #[error("operation requires an unfinished graph")]
    Finished,

    /// A finished-only query was called on a graph still under construction.
    #[error("operation requires a finished graph")]
    Unfinished,

    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Convenience alias used throughout the engine.
pub type GraphResult<T> = Result<T, GraphError>;
