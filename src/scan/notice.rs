use std::sync::Mutex;

use crate::engine::{Outcome, RejectReason};
use crate::token::DecodeError;

/// A user-facing message about one terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&Outcome> for Notice {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Committed {
                used_credits,
                total_credits,
                ..
            } => Notice::new(
                "Redeemed",
                format!("Used: {} / {}", used_credits, total_credits),
            ),
            Outcome::Rejected(reason) => match reason {
                RejectReason::InvalidToken(DecodeError::MalformedPayload(_)) => {
                    Notice::new("Invalid code", "The code could not be read.")
                }
                RejectReason::InvalidToken(DecodeError::WrongKind { .. }) => {
                    Notice::new("Invalid code", "This code is not a voucher book.")
                }
                RejectReason::InvalidToken(_) => {
                    Notice::new("Invalid code", "This code could not be verified.")
                }
                RejectReason::Expired => Notice::new(
                    "Expired code",
                    "Ask the holder to refresh their code and scan again.",
                ),
                RejectReason::NoBalance => Notice::new("Voucher book", "No balance left."),
                RejectReason::UnknownBook => Notice::new("Voucher book", "Voucher book not found."),
                RejectReason::StoreUnavailable(_) => Notice::new(
                    "Ledger unavailable",
                    "The redemption was not recorded. Please scan again.",
                ),
            },
        }
    }
}

/// Where notices are shown (an alert dialog, a toast, a log line).
pub trait NoticeSink: Send + Sync {
    fn show(&self, notice: &Notice);
}

/// Single-slot gate: at most one notice is on screen; others are not stacked.
#[derive(Debug, Default)]
pub struct NoticeSlot {
    current: Mutex<Option<Notice>>,
}

impl NoticeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy the slot. Returns `false`, leaving the shown notice in place, if
    /// the slot is taken.
    pub fn offer(&self, notice: Notice) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if current.is_some() {
            return false;
        }
        *current = Some(notice);
        true
    }

    /// Free the slot (the user acknowledged the notice).
    pub fn dismiss(&self) -> Option<Notice> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn current(&self) -> Option<Notice> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_occupied(&self) -> bool {
        self.current().is_some()
    }
}
