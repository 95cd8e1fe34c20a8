use thiserror::Error;

/// Recoverable conditions the store can hand back to a caller.
///
/// Programming errors (out-of-range column/row indices, a predicate kind the
/// column's type code does not support, registering a prefix/suffix index on
/// a non-string column) are not part of this enum — they panic at the call
/// site, same as an out-of-bounds slice index would.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowStoreError {
    #[error("capacity exhausted: table has reached its configured maximum of {max_pages} pages * {page_size} cells")]
    CapacityExhausted { page_size: usize, max_pages: usize },

    #[error("duplicate id: a live row already holds this primary key")]
    DuplicateId,
}

pub type Result<T> = std::result::Result<T, RowStoreError>;
