use std::sync::Arc;

use super::StoreError;
use crate::model::{RedemptionRecord, VoucherBook, VoucherBookId};

/// Result of a committed consume: the book after the increment and the record
/// written with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumed {
    pub book: VoucherBook,
    pub record: RedemptionRecord,
}

impl Consumed {
    pub fn new_used_credits(&self) -> u32 {
        self.book.used_credits()
    }
}

/// The three ledger operations. All are atomic with respect to each other for
/// the same book.
pub trait LedgerStore: Send + Sync {
    /// Return the owner's book, creating it with nothing used if absent.
    /// Concurrent calls for one owner observe the same book. A zero
    /// `total_credits` fails with [`StoreError::InvalidTotal`].
    fn get_or_create(&self, owner_id: &str, total_credits: u32) -> Result<VoucherBook, StoreError>;

    fn read_balance(&self, id: VoucherBookId) -> Result<VoucherBook, StoreError>;

    /// Consume one credit or fail without any visible change.
    fn try_consume_one(&self, id: VoucherBookId) -> Result<Consumed, StoreError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn get_or_create(&self, owner_id: &str, total_credits: u32) -> Result<VoucherBook, StoreError> {
        (**self).get_or_create(owner_id, total_credits)
    }

    fn read_balance(&self, id: VoucherBookId) -> Result<VoucherBook, StoreError> {
        (**self).read_balance(id)
    }

    fn try_consume_one(&self, id: VoucherBookId) -> Result<Consumed, StoreError> {
        (**self).try_consume_one(id)
    }
}
