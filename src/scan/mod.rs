//! Turning a camera's stream of decoded codes into well-spaced redemption attempts.
//!
//! The gate here is a per-device guard. It keeps one physical presentation
//! from being redeemed several times by the same scanner; it does nothing for
//! two devices scanning at once, which is the ledger's job.

mod controller;
mod gate;
mod notice;

pub use controller::{DropReason, ScanDisposition, ScanEvent, ScanLoopController, ScanStats};
pub use gate::{GateState, ScanGate};
pub use notice::{Notice, NoticeSink, NoticeSlot};
