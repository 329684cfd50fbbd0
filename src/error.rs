//! Error taxonomy (spec.md §7): every fallible operation returns one of
//! these four variants, never a bare `String` or `Box<dyn Error>`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Caller-supplied argument violates a precondition (out-of-range
    /// coordinate, bad octant/child index, malformed config).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The entity, node, or key a query named does not exist in the index.
    #[error("not found: {0}")]
    NotFound(String),

    /// An internal invariant was violated (e.g. a node's child mask disagrees
    /// with its arena slot, or an entity's back-reference points at a node
    /// that no longer exists). Surfacing this instead of panicking lets a
    /// long-running server recover instead of crashing.
    #[error("inconsistent tree state: {0}")]
    Inconsistent(String),

    /// A hard structural limit was hit (arena/pool capacity, max depth).
    #[error("capacity exceeded: {0}")]
    Capacity(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
