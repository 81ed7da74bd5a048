//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voucher_ledger::{
    ChangeNotifier, HashMapBackend, LedgerBackend, Notice, NoticeSink, RedemptionRecord,
    StoreError, VoucherBook, VoucherBookId,
};

pub const WAIT: Duration = Duration::from_secs(2);

/// Backend that can be switched offline, and counts every call it receives.
#[derive(Clone, Default)]
pub struct FlakyBackend {
    inner: HashMapBackend,
    offline: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

impl LedgerBackend for FlakyBackend {
    fn select_by_owner(&self, owner_id: &str) -> Result<Option<VoucherBook>, StoreError> {
        self.enter()?;
        self.inner.select_by_owner(owner_id)
    }

    fn insert_book(&self, book: &VoucherBook) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.insert_book(book)
    }

    fn select_by_id(&self, id: VoucherBookId) -> Result<Option<VoucherBook>, StoreError> {
        self.enter()?;
        self.inner.select_by_id(id)
    }

    fn conditional_consume(
        &self,
        id: VoucherBookId,
        expected_used: u32,
        record: RedemptionRecord,
    ) -> Result<VoucherBook, StoreError> {
        self.enter()?;
        self.inner.conditional_consume(id, expected_used, record)
    }

    fn select_redemptions(&self, id: VoucherBookId) -> Result<Vec<RedemptionRecord>, StoreError> {
        self.enter()?;
        self.inner.select_redemptions(id)
    }
}

/// Notice sink that remembers what it was asked to show.
#[derive(Clone, Default)]
pub struct RecordingSink {
    shown: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Notice> {
        self.shown.lock().unwrap().clone()
    }
}

impl NoticeSink for RecordingSink {
    fn show(&self, notice: &Notice) {
        self.shown.lock().unwrap().push(notice.clone());
    }
}

/// Subscribe to `book_id` and receive each delivered `used_credits` on a channel.
pub fn observe(notifier: &ChangeNotifier, book_id: VoucherBookId) -> Receiver<u32> {
    let (tx, rx) = channel();
    notifier.subscribe(book_id, move |change| {
        let _ = tx.send(change.used_credits);
    });
    rx
}
