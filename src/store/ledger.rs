use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Consumed, LedgerBackend, LedgerStore, StoreError};
use crate::bus::Publisher;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::model::{RedemptionRecord, VoucherBook, VoucherBookId};
use crate::notify::BalanceChanged;

/// [`LedgerStore`] over any [`LedgerBackend`].
///
/// Consumes use optimistic concurrency: read the balance, then ask the backend
/// to consume only if `used_credits` is unchanged. A conflict means another
/// device committed first, so the loop re-reads and tries again, up to
/// `max_retries` times.
pub struct Ledger<B> {
    backend: B,
    publisher: Option<Arc<dyn Publisher>>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl<B: LedgerBackend> Ledger<B> {
    pub fn new(backend: B) -> Self {
        Ledger {
            backend,
            publisher: None,
            clock: Arc::new(SystemClock),
            max_retries: LedgerConfig::default().max_cas_retries,
        }
    }

    pub fn with_config(mut self, config: &LedgerConfig) -> Self {
        self.max_retries = config.max_cas_retries;
        self
    }

    /// Publish a [`BalanceChanged`] event for every committed consume.
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All redemption records for a book, oldest first.
    pub fn redemptions(&self, id: VoucherBookId) -> Result<Vec<RedemptionRecord>, StoreError> {
        self.backend.select_redemptions(id)
    }

    /// Whether the number of redemption records matches `used_credits`.
    pub fn verify_consistency(&self, id: VoucherBookId) -> Result<bool, StoreError> {
        let book = self.read_balance(id)?;
        let records = self.backend.select_redemptions(id)?;
        Ok(records.len() == book.used_credits() as usize)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    fn publish(&self, consumed: &Consumed) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let result = BalanceChanged::from_book(&consumed.book)
            .to_event(consumed.record.id)
            .and_then(|event| publisher.publish(event));

        if let Err(err) = result {
            // Observers re-read on focus; a lost push is not a failed commit.
            warn!(book_id = %consumed.book.id(), error = %err, "balance change not published");
        }
    }
}

impl<B: LedgerBackend> LedgerStore for Ledger<B> {
    fn get_or_create(&self, owner_id: &str, total_credits: u32) -> Result<VoucherBook, StoreError> {
        if total_credits == 0 {
            return Err(StoreError::InvalidTotal(total_credits));
        }

        for _ in 0..self.attempts() {
            if let Some(book) = self.backend.select_by_owner(owner_id)? {
                return Ok(book);
            }

            let book = VoucherBook::new(owner_id, total_credits);
            match self.backend.insert_book(&book) {
                Ok(()) => {
                    info!(owner_id, book_id = %book.id(), total = total_credits, "voucher book created");
                    return Ok(book);
                }
                // Lost the race to another creator; their book is the owner's book.
                Err(StoreError::DuplicateOwner(_)) => {
                    debug!(owner_id, "voucher book created concurrently, re-reading");
                }
                Err(err) => return Err(err),
            }
        }

        Err(StoreError::Unavailable(format!(
            "could not resolve voucher book for owner {}",
            owner_id
        )))
    }

    fn read_balance(&self, id: VoucherBookId) -> Result<VoucherBook, StoreError> {
        self.backend
            .select_by_id(id)?
            .ok_or(StoreError::NotFound(id))
    }

    fn try_consume_one(&self, id: VoucherBookId) -> Result<Consumed, StoreError> {
        let attempts = self.attempts();

        for attempt in 1..=attempts {
            let current = self.read_balance(id)?;
            if current.is_exhausted() {
                return Err(StoreError::InsufficientBalance {
                    book_id: id,
                    total: current.total_credits(),
                });
            }

            let record = RedemptionRecord::new(id, self.clock.now());
            match self
                .backend
                .conditional_consume(id, current.used_credits(), record.clone())
            {
                Ok(book) => {
                    let consumed = Consumed { book, record };
                    self.publish(&consumed);
                    return Ok(consumed);
                }
                Err(StoreError::ConcurrentWrite { actual, .. }) => {
                    debug!(book_id = %id, attempt, actual, "consume conflicted, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        warn!(book_id = %id, attempts, "consume abandoned under contention");
        Err(StoreError::Contention { book_id: id, attempts })
    }
}
