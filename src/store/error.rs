use thiserror::Error;

use crate::model::VoucherBookId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("voucher book {0} not found")]
    NotFound(VoucherBookId),
    #[error("voucher book {book_id} has no credits left ({total} of {total} used)")]
    InsufficientBalance { book_id: VoucherBookId, total: u32 },
    #[error("a voucher book needs at least one credit, got {0}")]
    InvalidTotal(u32),
    #[error("owner {0} already has a voucher book")]
    DuplicateOwner(String),
    #[error("concurrent write detected for voucher book {book_id} (expected used {expected}, got {actual})")]
    ConcurrentWrite {
        book_id: VoucherBookId,
        expected: u32,
        actual: u32,
    },
    #[error("gave up on voucher book {book_id} after {attempts} conflicting attempts")]
    Contention { book_id: VoucherBookId, attempts: u32 },
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Failures of the store itself, as opposed to answers about the data.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Contention { .. })
    }
}
