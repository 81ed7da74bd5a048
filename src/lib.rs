//! Prepaid voucher books redeemed by scanning a code.
//!
//! A holder shows a code for their book ([`HolderSession`]); staff devices
//! scan it ([`ScanLoopController`]) and the [`RedemptionEngine`] consumes one
//! credit through a [`LedgerStore`]. Committed balances are pushed to
//! observers through a [`ChangeNotifier`].

pub mod bus;
pub mod clock;
mod config;
pub mod engine;
mod holder;
pub mod model;
pub mod notify;
pub mod scan;
pub mod store;
pub mod token;

pub use bus::{Event, PublishError, Publisher};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use engine::{Attempt, AttemptState, FreshnessPolicy, Outcome, RedemptionEngine, RejectReason};
pub use holder::HolderSession;
pub use model::{RedemptionId, RedemptionRecord, VoucherBook, VoucherBookId};
pub use notify::{BalanceChanged, BalanceWatcher, ChangeNotifier, DisplayBalance, SubscriptionId};
pub use scan::{
    DropReason, GateState, Notice, NoticeSink, NoticeSlot, ScanDisposition, ScanEvent,
    ScanGate, ScanLoopController, ScanStats,
};
pub use store::{Consumed, HashMapBackend, Ledger, LedgerBackend, LedgerStore, StoreError};
pub use token::{DecodeError, RedemptionToken, TokenCodec, TokenSigner, VOUCHER_BOOK_KIND};
