//! Tunables shared by both engines (spec.md §5's configuration surface).

/// When an entity's bounds don't fit fully inside any single child cell,
/// whether to fan it out across every child cell it overlaps (recording
/// one location per cell) or fall back to the smallest common-ancestor
/// cell as a single location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanningPolicy {
    /// Never span; always resolve to the single common-ancestor cell.
    None,
    /// Span only when the entity overlaps at most this many sibling
    /// cells; fall back to the common ancestor past the cap.
    PerLevelCap(u8),
    /// Always span across every cell the entity overlaps.
    Always,
}

/// Trades insert throughput for ordering/locality during `insert_batch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdivisionStrategy {
    /// Subdivide as soon as `max_entities_per_node` is exceeded.
    Balanced,
    /// Subdivide eagerly, one level ahead of strict necessity, to keep
    /// leaves shallow under further inserts.
    Aggressive,
    /// Defer subdivision until a read actually needs the finer level.
    Lazy,
}

#[derive(Debug, Clone, Copy)]
pub struct BulkConfig {
    /// Entities per worker chunk in `insert_batch`.
    pub batch_size: usize,
    /// Worker thread count; `0` means "use all available cores".
    pub parallelism: usize,
    /// Sort the batch by SFC key before partitioning, improving locality at
    /// the cost of an upfront sort.
    pub pre_sort_by_sfc: bool,
    /// Skip subdivision during the parallel phase and run one subdivision
    /// pass after all chunks land.
    pub defer_subdivision: bool,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            batch_size: 4096,
            parallelism: 0,
            pre_sort_by_sfc: true,
            defer_subdivision: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    pub max_entities_per_node: usize,
    pub max_depth: u8,
    pub spanning_policy: SpanningPolicy,
    pub subdivision_strategy: SubdivisionStrategy,
    pub bulk: BulkConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_entities_per_node: 10,
            max_depth: 21,
            spanning_policy: SpanningPolicy::PerLevelCap(2),
            subdivision_strategy: SubdivisionStrategy::Balanced,
            bulk: BulkConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sane() {
        let cfg = IndexConfig::default();
        assert!(cfg.max_entities_per_node > 0);
        assert!(cfg.max_depth <= 21);
    }
}
