use serde::{Deserialize, Serialize};

use crate::bus::{Event, PublishError};
use crate::model::{RedemptionId, VoucherBook, VoucherBookId};

/// Committed balance of one book, as seen right after a consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChanged {
    pub voucher_book_id: VoucherBookId,
    pub owner_id: String,
    pub used_credits: u32,
    pub total_credits: u32,
}

impl BalanceChanged {
    pub const EVENT_TYPE: &'static str = "BalanceChanged";

    pub fn from_book(book: &VoucherBook) -> Self {
        BalanceChanged {
            voucher_book_id: book.id(),
            owner_id: book.owner_id().to_string(),
            used_credits: book.used_credits(),
            total_credits: book.total_credits(),
        }
    }

    pub fn book(&self) -> VoucherBook {
        VoucherBook::from_parts(
            self.voucher_book_id,
            self.owner_id.clone(),
            self.total_credits,
            self.used_credits,
        )
    }

    /// Wrap into a bus event keyed by the redemption that caused it.
    pub fn to_event(&self, cause: RedemptionId) -> Result<Event, PublishError> {
        Event::encode(cause.to_string(), Self::EVENT_TYPE, self)
    }

    /// `None` for events of another type.
    pub fn from_event(event: &Event) -> Option<Result<Self, PublishError>> {
        (event.event_type == Self::EVENT_TYPE).then(|| event.decode())
    }
}
