use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{LedgerBackend, StoreError};
use crate::model::{RedemptionRecord, VoucherBook, VoucherBookId};

#[derive(Default)]
struct Tables {
    books: HashMap<VoucherBookId, VoucherBook>,
    // Unique index: one book per owner.
    owners: HashMap<String, VoucherBookId>,
    redemptions: HashMap<VoucherBookId, Vec<RedemptionRecord>>,
}

/// In-memory backend. All tables sit behind one `RwLock`, so every write is a
/// serializable transaction. Clones share the same tables.
#[derive(Clone, Default)]
pub struct HashMapBackend {
    tables: Arc<RwLock<Tables>>,
}

impl HashMapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned during read".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned during write".into()))
    }
}

impl LedgerBackend for HashMapBackend {
    fn select_by_owner(&self, owner_id: &str) -> Result<Option<VoucherBook>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .owners
            .get(owner_id)
            .and_then(|id| tables.books.get(id))
            .cloned())
    }

    fn insert_book(&self, book: &VoucherBook) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.owners.contains_key(book.owner_id()) {
            return Err(StoreError::DuplicateOwner(book.owner_id().to_string()));
        }

        tables.owners.insert(book.owner_id().to_string(), book.id());
        tables.books.insert(book.id(), book.clone());
        Ok(())
    }

    fn select_by_id(&self, id: VoucherBookId) -> Result<Option<VoucherBook>, StoreError> {
        Ok(self.read()?.books.get(&id).cloned())
    }

    fn conditional_consume(
        &self,
        id: VoucherBookId,
        expected_used: u32,
        record: RedemptionRecord,
    ) -> Result<VoucherBook, StoreError> {
        let mut tables = self.write()?;
        let tables = &mut *tables;

        let book = tables.books.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if book.used_credits() != expected_used {
            return Err(StoreError::ConcurrentWrite {
                book_id: id,
                expected: expected_used,
                actual: book.used_credits(),
            });
        }
        if book.consume_one().is_none() {
            return Err(StoreError::InsufficientBalance {
                book_id: id,
                total: book.total_credits(),
            });
        }

        tables.redemptions.entry(id).or_default().push(record);
        Ok(book.clone())
    }

    fn select_redemptions(&self, id: VoucherBookId) -> Result<Vec<RedemptionRecord>, StoreError> {
        Ok(self
            .read()?
            .redemptions
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn seeded(total: u32) -> (HashMapBackend, VoucherBook) {
        let backend = HashMapBackend::new();
        let book = VoucherBook::new("owner-1", total);
        backend.insert_book(&book).unwrap();
        (backend, book)
    }

    #[test]
    fn new() {
        let backend = HashMapBackend::new();
        assert!(backend.select_by_owner("nobody").unwrap().is_none());
        assert!(backend.select_by_id(VoucherBookId::new()).unwrap().is_none());
    }

    #[test]
    fn owner_index_is_unique() {
        let (backend, _) = seeded(30);
        let err = backend
            .insert_book(&VoucherBook::new("owner-1", 30))
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateOwner("owner-1".into()));
    }

    #[test]
    fn select_by_owner_and_id_agree() {
        let (backend, book) = seeded(30);
        assert_eq!(backend.select_by_owner("owner-1").unwrap(), Some(book.clone()));
        assert_eq!(backend.select_by_id(book.id()).unwrap(), Some(book));
    }

    #[test]
    fn consume_increments_and_appends() {
        let (backend, book) = seeded(2);
        let record = RedemptionRecord::new(book.id(), SystemTime::now());

        let updated = backend
            .conditional_consume(book.id(), 0, record.clone())
            .unwrap();
        assert_eq!(updated.used_credits(), 1);
        assert_eq!(backend.select_redemptions(book.id()).unwrap(), vec![record]);
    }

    #[test]
    fn stale_expectation_is_a_conflict() {
        let (backend, book) = seeded(5);
        backend
            .conditional_consume(book.id(), 0, RedemptionRecord::new(book.id(), SystemTime::now()))
            .unwrap();

        let err = backend
            .conditional_consume(book.id(), 0, RedemptionRecord::new(book.id(), SystemTime::now()))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::ConcurrentWrite {
                book_id: book.id(),
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(backend.select_redemptions(book.id()).unwrap().len(), 1);
    }

    #[test]
    fn exhausted_book_is_untouched() {
        let (backend, book) = seeded(1);
        backend
            .conditional_consume(book.id(), 0, RedemptionRecord::new(book.id(), SystemTime::now()))
            .unwrap();

        let err = backend
            .conditional_consume(book.id(), 1, RedemptionRecord::new(book.id(), SystemTime::now()))
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientBalance { total: 1, .. }));
        assert_eq!(backend.select_by_id(book.id()).unwrap().unwrap().used_credits(), 1);
        assert_eq!(backend.select_redemptions(book.id()).unwrap().len(), 1);
    }

    #[test]
    fn unknown_book() {
        let backend = HashMapBackend::new();
        let id = VoucherBookId::new();
        let err = backend
            .conditional_consume(id, 0, RedemptionRecord::new(id, SystemTime::now()))
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id));
    }
}
