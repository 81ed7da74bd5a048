use std::sync::{Arc, Mutex};

use tracing::warn;

use super::{ChangeNotifier, SubscriptionId};
use crate::model::{VoucherBook, VoucherBookId};
use crate::store::{LedgerStore, StoreError};

/// What a display should show for a book's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBalance {
    /// Never loaded, or the book does not exist.
    Unknown,
    Known(VoucherBook),
    /// Last known value; the store could not be reached since.
    Stale(VoucherBook),
}

impl DisplayBalance {
    pub fn book(&self) -> Option<&VoucherBook> {
        match self {
            DisplayBalance::Unknown => None,
            DisplayBalance::Known(book) | DisplayBalance::Stale(book) => Some(book),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, DisplayBalance::Stale(_))
    }

    /// Keep whichever of the two has consumed more; balances never go back.
    fn absorb(&mut self, fresh: VoucherBook) {
        let newer = match self.book() {
            Some(current) => fresh.used_credits() >= current.used_credits(),
            None => true,
        };
        if newer {
            *self = DisplayBalance::Known(fresh);
        } else if let DisplayBalance::Stale(current) = self {
            *self = DisplayBalance::Known(current.clone());
        }
    }

    fn degrade(&mut self) {
        if let DisplayBalance::Known(book) = self {
            *self = DisplayBalance::Stale(book.clone());
        }
    }
}

/// One observer's view of one book, kept fresh by both paths: pushed changes
/// from a [`ChangeNotifier`] and explicit [`refresh`](Self::refresh) calls made
/// when the display regains focus or connectivity.
pub struct BalanceWatcher<S> {
    store: S,
    book_id: VoucherBookId,
    state: Arc<Mutex<DisplayBalance>>,
    subscription: Option<(Arc<ChangeNotifier>, SubscriptionId)>,
}

impl<S: LedgerStore> BalanceWatcher<S> {
    /// A pull-only watcher. Starts `Unknown` until the first refresh.
    pub fn new(store: S, book_id: VoucherBookId) -> Self {
        BalanceWatcher {
            store,
            book_id,
            state: Arc::new(Mutex::new(DisplayBalance::Unknown)),
            subscription: None,
        }
    }

    /// Also receive pushed changes. Replaces any earlier subscription.
    pub fn attach(&mut self, notifier: Arc<ChangeNotifier>) {
        self.detach();

        let state = Arc::clone(&self.state);
        let id = notifier.subscribe(self.book_id, move |change| {
            let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            state.absorb(change.book());
        });
        self.subscription = Some((notifier, id));
    }

    pub fn detach(&mut self) {
        if let Some((notifier, id)) = self.subscription.take() {
            notifier.unsubscribe(self.book_id, id);
        }
    }

    pub fn book_id(&self) -> VoucherBookId {
        self.book_id
    }

    pub fn current(&self) -> DisplayBalance {
        self.lock_state().clone()
    }

    /// Re-read the balance from the store. Store outages degrade the display
    /// to stale instead of failing.
    pub fn refresh(&self) -> DisplayBalance {
        let result = self.store.read_balance(self.book_id);

        let mut state = self.lock_state();
        match result {
            Ok(book) => state.absorb(book),
            Err(StoreError::NotFound(_)) => *state = DisplayBalance::Unknown,
            Err(err) => {
                warn!(book_id = %self.book_id, error = %err, "balance refresh failed, showing last known value");
                state.degrade();
            }
        }
        state.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DisplayBalance> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S> Drop for BalanceWatcher<S> {
    fn drop(&mut self) {
        if let Some((notifier, id)) = self.subscription.take() {
            notifier.unsubscribe(self.book_id, id);
        }
    }
}
