//! Dual-mode sparse directed graph storage engine.
//!
//! A [`graph::SparseGraph`] starts in a dynamic mode built for incremental
//! construction (per-row circular adjacency lists over shared edge arrays)
//! and is frozen by `finish` into a compact CSR form for analysis. The
//! [`algorithms`] module layers reachability and terminal-SCC computation on
//! top; [`timer`] provides the progress hooks wrapped around the long
//! phases.

pub mod algorithms;
pub mod config;
pub mod error;
pub mod graph;
pub mod timer;
