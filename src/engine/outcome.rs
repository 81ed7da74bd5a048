use thiserror::Error;

use crate::model::VoucherBookId;
use crate::scan::Notice;
use crate::store::StoreError;
use crate::token::DecodeError;

/// Why an attempt ended without consuming a credit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("invalid token: {0}")]
    InvalidToken(DecodeError),
    #[error("token expired")]
    Expired,
    #[error("no credits left")]
    NoBalance,
    #[error("unknown voucher book")]
    UnknownBook,
    #[error("ledger unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for RejectReason {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => RejectReason::UnknownBook,
            StoreError::InsufficientBalance { .. } => RejectReason::NoBalance,
            other => RejectReason::StoreUnavailable(other.to_string()),
        }
    }
}

/// Terminal result of one redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed {
        voucher_book_id: VoucherBookId,
        used_credits: u32,
        total_credits: u32,
    },
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed { .. })
    }

    /// The single notification to show the user for this outcome.
    pub fn notice(&self) -> Notice {
        Notice::from(self)
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            Outcome::Rejected(reason) => Some(reason),
            Outcome::Committed { .. } => None,
        }
    }
}
