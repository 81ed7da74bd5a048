//! Getting committed balances to the holder's screen and staff dashboards.
//!
//! Push: the ledger publishes a [`BalanceChanged`] per commit and the
//! [`ChangeNotifier`] fans it out. Pull: a [`BalanceWatcher`] re-reads the
//! store on demand. Displays need both, since push delivery is best-effort.

mod balance_changed;
mod notifier;
mod watcher;

pub use balance_changed::BalanceChanged;
pub use notifier::{ChangeNotifier, SubscriptionId};
pub use watcher::{BalanceWatcher, DisplayBalance};
