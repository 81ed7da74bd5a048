//! The per-attempt redemption state machine.
//!
//! ```text
//! Received ──decode──▶ Decoded ──authorize──▶ Authorized ──consume──▶ Committed
//!     │                   │                        │
//!     └───────────────────┴────────────────────────┴──────────────▶ Rejected(reason)
//! ```
//!
//! Tokens are not deduplicated here. Presenting the same code twice redeems
//! twice while credits remain; the scan loop's cooldown is what keeps one
//! physical presentation from counting more than once.

mod attempt;
mod outcome;
mod policy;
mod redemption_engine;

pub use attempt::{Attempt, AttemptState};
pub use outcome::{Outcome, RejectReason};
pub use policy::FreshnessPolicy;
pub use redemption_engine::RedemptionEngine;
