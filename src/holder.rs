use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::engine::{Outcome, RejectReason};
use crate::model::{VoucherBook, VoucherBookId};
use crate::notify::BalanceWatcher;
use crate::store::{LedgerStore, StoreError};
use crate::token::TokenCodec;

/// The holder's side of a voucher book: find or create it, show its code and
/// what is left.
pub struct HolderSession<S> {
    store: S,
    codec: TokenCodec,
    book: VoucherBook,
}

impl<S: LedgerStore> HolderSession<S> {
    /// Look up the owner's book, creating it with `total_credits` on first use.
    pub fn open(
        store: S,
        codec: TokenCodec,
        owner_id: &str,
        total_credits: u32,
    ) -> Result<Self, StoreError> {
        let book = store.get_or_create(owner_id, total_credits)?;
        debug!(owner_id, book_id = %book.id(), used = book.used_credits(), "holder session opened");
        Ok(HolderSession { store, codec, book })
    }

    /// [`open`](Self::open) with the configured default number of credits.
    pub fn open_with_config(
        store: S,
        codec: TokenCodec,
        owner_id: &str,
        config: &LedgerConfig,
    ) -> Result<Self, StoreError> {
        Self::open(store, codec, owner_id, config.default_total_credits)
    }

    pub fn book_id(&self) -> VoucherBookId {
        self.book.id()
    }

    /// The book as of the last [`reload`](Self::reload) or open.
    pub fn book(&self) -> &VoucherBook {
        &self.book
    }

    /// A freshly stamped payload to render as a QR code.
    pub fn qr_payload(&self) -> String {
        self.codec.encode(self.book.id())
    }

    /// Re-read the book from the store.
    pub fn reload(&mut self) -> Result<&VoucherBook, StoreError> {
        self.book = self.store.read_balance(self.book.id())?;
        Ok(&self.book)
    }

    /// Consume one credit from the holder's own device.
    ///
    /// Goes through the same atomic consume as a staff scan, so it cannot
    /// overspend against concurrent redemptions.
    pub fn redeem_one(&mut self) -> Outcome {
        match self.store.try_consume_one(self.book.id()) {
            Ok(consumed) => {
                self.book = consumed.book;
                info!(book_id = %self.book.id(), used = self.book.used_credits(), "holder redeemed a credit");
                Outcome::Committed {
                    voucher_book_id: self.book.id(),
                    used_credits: self.book.used_credits(),
                    total_credits: self.book.total_credits(),
                }
            }
            Err(err) => {
                let reason = RejectReason::from(err);
                if reason == RejectReason::NoBalance {
                    // Another device used the last credit; show what the store has.
                    if let Ok(book) = self.store.read_balance(self.book.id()) {
                        self.book = book;
                    }
                }
                info!(book_id = %self.book.id(), reason = %reason, "holder redemption rejected");
                Outcome::Rejected(reason)
            }
        }
    }

    /// Credits left, read from the store.
    pub fn remaining(&mut self) -> Result<u32, StoreError> {
        Ok(self.reload()?.remaining())
    }
}

impl<S: LedgerStore + Clone> HolderSession<S> {
    /// A pull-only watcher over this book sharing the session's store.
    pub fn watcher(&self) -> BalanceWatcher<S> {
        BalanceWatcher::new(self.store.clone(), self.book.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::DisplayBalance;
    use crate::store::{HashMapBackend, Ledger};
    use std::sync::Arc;

    fn session(owner: &str) -> (Arc<Ledger<HashMapBackend>>, HolderSession<Arc<Ledger<HashMapBackend>>>) {
        let ledger = Arc::new(Ledger::new(HashMapBackend::new()));
        let session = HolderSession::open(ledger.clone(), TokenCodec::new(), owner, 30).unwrap();
        (ledger, session)
    }

    #[test]
    fn open_reuses_the_owners_book() {
        let (ledger, first) = session("holder");
        let second = HolderSession::open(ledger, TokenCodec::new(), "holder", 10).unwrap();
        assert_eq!(first.book_id(), second.book_id());
        assert_eq!(second.book().total_credits(), 30);
    }

    #[test]
    fn configured_default_credits() {
        let ledger = Arc::new(Ledger::new(HashMapBackend::new()));
        let config = LedgerConfig::new().with_default_total_credits(12);
        let session =
            HolderSession::open_with_config(ledger, TokenCodec::new(), "holder", &config).unwrap();
        assert_eq!(session.book().total_credits(), 12);
    }

    #[test]
    fn payload_decodes_to_the_book() {
        let (_, session) = session("holder");
        let token = TokenCodec::new().decode(&session.qr_payload()).unwrap();
        assert_eq!(token.voucher_book_id, session.book_id());
    }

    #[test]
    fn remaining_follows_the_store() {
        let (ledger, mut session) = session("holder");
        assert_eq!(session.remaining().unwrap(), 30);

        ledger.try_consume_one(session.book_id()).unwrap();
        ledger.try_consume_one(session.book_id()).unwrap();
        assert_eq!(session.remaining().unwrap(), 28);
        assert_eq!(session.book().used_credits(), 2);
    }

    #[test]
    fn holder_redeems_until_exhausted() {
        let ledger = Arc::new(Ledger::new(HashMapBackend::new()));
        let mut session = HolderSession::open(ledger.clone(), TokenCodec::new(), "holder", 2).unwrap();

        assert!(session.redeem_one().is_committed());
        // A staff device takes the last credit behind the session's back.
        ledger.try_consume_one(session.book_id()).unwrap();

        assert_eq!(session.redeem_one(), Outcome::Rejected(RejectReason::NoBalance));
        assert_eq!(session.book().used_credits(), 2);
        assert!(ledger.verify_consistency(session.book_id()).unwrap());
    }

    #[test]
    fn watcher_reads_the_same_book() {
        let (ledger, session) = session("holder");
        ledger.try_consume_one(session.book_id()).unwrap();

        let watcher = session.watcher();
        match watcher.refresh() {
            DisplayBalance::Known(book) => assert_eq!(book.used_credits(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
