//! Transport seam between the ledger and whatever carries balance changes.
//!
//! The ledger only knows the [`Publisher`] trait. The in-process
//! [`ChangeNotifier`](crate::notify::ChangeNotifier) is one implementation;
//! a broker-backed one (Postgres `LISTEN`, Redis streams, a websocket fan-out)
//! would be another.

mod publisher;

pub use publisher::{Event, PublishError, Publisher};
