//! Analysis algorithms layered on the graph storage: one-step and full
//! reachability, and the terminal-SCC engine used for absorbing-state
//! analysis.

pub mod reach;
pub mod scc;
