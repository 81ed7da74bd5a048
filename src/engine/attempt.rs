use super::{Outcome, RejectReason};
use crate::model::VoucherBook;
use crate::token::RedemptionToken;

/// Where a single redemption attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Received(String),
    Decoded(RedemptionToken),
    Authorized(RedemptionToken),
    Committed(VoucherBook),
    Rejected(RejectReason),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Committed(_) | AttemptState::Rejected(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::Received(_) => "received",
            AttemptState::Decoded(_) => "decoded",
            AttemptState::Authorized(_) => "authorized",
            AttemptState::Committed(_) => "committed",
            AttemptState::Rejected(_) => "rejected",
        }
    }
}

/// One redemption attempt, advanced by [`RedemptionEngine::step`](super::RedemptionEngine::step).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub(super) state: AttemptState,
}

impl Attempt {
    pub fn new(raw: impl Into<String>) -> Self {
        Attempt {
            state: AttemptState::Received(raw.into()),
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The terminal outcome, or `None` while the attempt is still in progress.
    pub fn outcome(&self) -> Option<Outcome> {
        match &self.state {
            AttemptState::Committed(book) => Some(Outcome::Committed {
                voucher_book_id: book.id(),
                used_credits: book.used_credits(),
                total_credits: book.total_credits(),
            }),
            AttemptState::Rejected(reason) => Some(Outcome::Rejected(reason.clone())),
            _ => None,
        }
    }
}
