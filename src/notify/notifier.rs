use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::BalanceChanged;
use crate::bus::{Event, PublishError, Publisher};
use crate::model::VoucherBookId;

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&BalanceChanged) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    callback: Callback,
    // Highest used_credits delivered so far; dropped with the subscription.
    delivered: AtomicU32,
}

impl Subscription {
    /// Record `used` as delivered unless something newer already was.
    fn advance_to(&self, used: u32) -> bool {
        self.delivered.fetch_max(used, Ordering::AcqRel) < used
    }
}

#[derive(Default)]
struct Registry {
    by_book: RwLock<HashMap<VoucherBookId, Vec<Arc<Subscription>>>>,
    next_id: AtomicU64,
}

enum Command {
    Deliver(Event),
    Stop,
}

/// In-process fan-out of committed balances to observers.
///
/// `publish` only enqueues; a dispatcher thread invokes callbacks, so a slow
/// observer never delays a commit. Per book and per subscriber, delivered
/// `used_credits` values only increase. Delivery is best-effort: an observer
/// subscribed after a commit does not see it and should call
/// [`BalanceWatcher::refresh`](super::BalanceWatcher::refresh).
///
/// ## Example
///
/// ```
/// use std::sync::{mpsc, Arc};
/// use std::time::Duration;
/// use voucher_ledger::{ChangeNotifier, HashMapBackend, Ledger, LedgerStore};
///
/// let notifier = Arc::new(ChangeNotifier::new());
/// let ledger = Ledger::new(HashMapBackend::new()).with_publisher(notifier.clone());
/// let book = ledger.get_or_create("holder-1", 30).unwrap();
///
/// let (tx, rx) = mpsc::channel();
/// notifier.subscribe(book.id(), move |change| {
///     let _ = tx.send(change.used_credits);
/// });
///
/// ledger.try_consume_one(book.id()).unwrap();
/// assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 1);
/// ```
pub struct ChangeNotifier {
    registry: Arc<Registry>,
    sender: Mutex<Sender<Command>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeNotifier {
    /// Start the dispatcher thread.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::default());
        let (sender, receiver) = channel();

        let dispatcher_registry = Arc::clone(&registry);
        let handle = thread::Builder::new()
            .name("balance-notifier".into())
            .spawn(move || dispatch(dispatcher_registry, receiver));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                // Publishing will report ConnectionFailed and the ledger degrades.
                warn!(error = %err, "balance notifier thread failed to start");
                None
            }
        };

        ChangeNotifier {
            registry,
            sender: Mutex::new(sender),
            handle: Mutex::new(handle),
        }
    }

    /// Register `callback` for committed balance changes of `book_id`.
    pub fn subscribe<F>(&self, book_id: VoucherBookId, callback: F) -> SubscriptionId
    where
        F: Fn(&BalanceChanged) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let mut by_book = self
            .registry
            .by_book
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        by_book.entry(book_id).or_default().push(Arc::new(Subscription {
            id,
            callback: Box::new(callback),
            delivered: AtomicU32::new(0),
        }));
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, book_id: VoucherBookId, subscription: SubscriptionId) -> bool {
        let mut by_book = self
            .registry
            .by_book
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(subscriptions) = by_book.get_mut(&book_id) else {
            return false;
        };

        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != subscription);
        let removed = subscriptions.len() != before;
        if subscriptions.is_empty() {
            by_book.remove(&book_id);
        }
        removed
    }

    pub fn subscriber_count(&self, book_id: VoucherBookId) -> usize {
        self.registry
            .by_book
            .read()
            .map(|by_book| by_book.get(&book_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Stop the dispatcher after it drains what is already queued.
    /// Later publishes fail with [`PublishError::ConnectionFailed`].
    pub fn shutdown(&self) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Command::Stop);
        }
        let handle = self
            .handle
            .lock()
            .map(|mut handle| handle.take())
            .unwrap_or(None);
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChangeNotifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Publisher for ChangeNotifier {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| PublishError::ConnectionFailed("notifier sender poisoned".into()))?;
        sender
            .send(Command::Deliver(event))
            .map_err(|_| PublishError::ConnectionFailed("notifier stopped".into()))
    }
}

fn dispatch(registry: Arc<Registry>, receiver: Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        let event = match command {
            Command::Deliver(event) => event,
            Command::Stop => break,
        };

        let change = match BalanceChanged::from_event(&event) {
            Some(Ok(change)) => change,
            Some(Err(err)) => {
                warn!(event_id = %event.id, error = %err, "undecodable balance change dropped");
                continue;
            }
            None => {
                debug!(event_type = %event.event_type, "ignoring event");
                continue;
            }
        };

        // Snapshot so callbacks may subscribe or unsubscribe without deadlocking.
        let targets: Vec<Arc<Subscription>> = match registry.by_book.read() {
            Ok(by_book) => by_book
                .get(&change.voucher_book_id)
                .cloned()
                .unwrap_or_default(),
            Err(_) => continue,
        };

        for subscription in targets {
            if !subscription.advance_to(change.used_credits) {
                continue;
            }

            if catch_unwind(AssertUnwindSafe(|| (subscription.callback)(&change))).is_err() {
                warn!(book_id = %change.voucher_book_id, "balance observer panicked");
            }
        }
    }
}
