//! Per-edge payload types and the merge policy applied to duplicates.

/// Fixed-size payload carried by every edge of a graph.
///
/// The payload type is chosen when the graph is instantiated; an unlabeled
/// graph uses `()`, for which the label array is zero-sized and every label
/// operation compiles away. `merge` defines how a duplicate insertion
/// combines with the edge already stored, and is only invoked on graphs
/// built with duplicate merging enabled.
pub trait EdgeLabel: Copy + Default + PartialEq + std::fmt::Debug {
    /// Folds `incoming` into the stored label when a duplicate edge arrives.
    fn merge(&mut self, incoming: Self);
}

impl EdgeLabel for () {
    fn merge(&mut self, _incoming: Self) {}
}

/// Additive accumulator, e.g. transition counts.
impl EdgeLabel for u64 {
    fn merge(&mut self, incoming: Self) {
        *self += incoming;
    }
}

/// Additive accumulator, e.g. transition rates.
impl EdgeLabel for f64 {
    fn merge(&mut self, incoming: Self) {
        *self += incoming;
    }
}

#[cfg(test)]
mod test_labels {
    use super::*;

    #[test]
    fn test_unit_merge_is_noop() {
        let mut label = ();
        label.merge(());
        assert_eq!(label, ());
    }

    #[test]
    fn test_numeric_merge_accumulates() {
        let mut count = 3u64;
        count.merge(4);
        assert_eq!(count, 7);

        let mut rate = 0.5f64;
        rate.merge(0.25);
        assert_eq!(rate, 0.75);
    }
}
