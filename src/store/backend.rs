use std::sync::Arc;

use super::StoreError;
use crate::model::{RedemptionRecord, VoucherBook, VoucherBookId};

/// Request/response boundary to the storage engine.
///
/// Each method is one round trip. Only `conditional_consume` mutates a
/// balance, and it must do so atomically: a transaction with a row lock, or a
/// single `UPDATE ... WHERE used_credits = $expected AND used_credits < total_credits`
/// paired with the record insert.
pub trait LedgerBackend: Send + Sync {
    fn select_by_owner(&self, owner_id: &str) -> Result<Option<VoucherBook>, StoreError>;

    /// Insert a new book. Fails with [`StoreError::DuplicateOwner`] when the
    /// owner already has one; the uniqueness check lives here, not in callers.
    fn insert_book(&self, book: &VoucherBook) -> Result<(), StoreError>;

    fn select_by_id(&self, id: VoucherBookId) -> Result<Option<VoucherBook>, StoreError>;

    /// Atomically: if the book's `used_credits` still equals `expected_used`
    /// and a credit remains, increment it and append `record`.
    ///
    /// Errors: [`StoreError::NotFound`], [`StoreError::InsufficientBalance`],
    /// or [`StoreError::ConcurrentWrite`] when the expected value is stale.
    fn conditional_consume(
        &self,
        id: VoucherBookId,
        expected_used: u32,
        record: RedemptionRecord,
    ) -> Result<VoucherBook, StoreError>;

    fn select_redemptions(&self, id: VoucherBookId) -> Result<Vec<RedemptionRecord>, StoreError>;
}

impl<B: LedgerBackend + ?Sized> LedgerBackend for Arc<B> {
    fn select_by_owner(&self, owner_id: &str) -> Result<Option<VoucherBook>, StoreError> {
        (**self).select_by_owner(owner_id)
    }

    fn insert_book(&self, book: &VoucherBook) -> Result<(), StoreError> {
        (**self).insert_book(book)
    }

    fn select_by_id(&self, id: VoucherBookId) -> Result<Option<VoucherBook>, StoreError> {
        (**self).select_by_id(id)
    }

    fn conditional_consume(
        &self,
        id: VoucherBookId,
        expected_used: u32,
        record: RedemptionRecord,
    ) -> Result<VoucherBook, StoreError> {
        (**self).conditional_consume(id, expected_used, record)
    }

    fn select_redemptions(&self, id: VoucherBookId) -> Result<Vec<RedemptionRecord>, StoreError> {
        (**self).select_redemptions(id)
    }
}
