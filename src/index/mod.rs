//! The index plane: advisory structures over row ids, never authoritative on
//! their own (spec.md §4.6, Invariant I1). Every lookup here is filtered
//! through a [`Validator`] supplied by the table, which is the only party
//! that knows whether a row id is still live.

pub mod composite;
pub mod hash;
pub mod id_index;
pub mod prefix_suffix;
pub mod range;

pub use composite::{CompositeHashIndex, CompositeRangeIndex};
pub use hash::HashIndex;
pub use id_index::IdIndex;
pub use prefix_suffix::{PrefixIndex, SuffixIndex};
pub use range::RangeIndex;

/// `row_id -> bool`: "not tombstoned and generation matches." Indexes apply
/// this to every candidate before it is surfaced to a caller.
pub type Validator<'a> = &'a dyn Fn(u32) -> bool;
