//! Durable record of voucher books and redemptions.
//!
//! Two layers:
//!
//! - [`LedgerBackend`] is the storage boundary: plain selects and inserts plus
//!   one atomic conditional consume (compare `used_credits`, increment, append
//!   the redemption record). [`HashMapBackend`] implements it in memory.
//! - [`Ledger`] builds the [`LedgerStore`] operations on top of any backend
//!   with an optimistic retry loop, and publishes a balance change for every
//!   committed consume.

mod backend;
mod error;
mod hashmap;
mod ledger;
mod ledger_store;

pub use backend::LedgerBackend;
pub use error::StoreError;
pub use hashmap::HashMapBackend;
pub use ledger::Ledger;
pub use ledger_store::{Consumed, LedgerStore};
