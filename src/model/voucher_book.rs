use serde::{Deserialize, Serialize};

use super::VoucherBookId;

/// A holder's book of prepaid meal credits.
///
/// `used_credits` is the only field that changes after creation, and only the
/// ledger's atomic consume operation changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredBook")]
pub struct VoucherBook {
    id: VoucherBookId,
    owner_id: String,
    total_credits: u32,
    used_credits: u32,
}

/// Wire shape of a book; deserialization goes through [`VoucherBook::from_parts`].
#[derive(Deserialize)]
struct StoredBook {
    id: VoucherBookId,
    owner_id: String,
    total_credits: u32,
    used_credits: u32,
}

impl From<StoredBook> for VoucherBook {
    fn from(stored: StoredBook) -> Self {
        VoucherBook::from_parts(
            stored.id,
            stored.owner_id,
            stored.total_credits,
            stored.used_credits,
        )
    }
}

impl VoucherBook {
    /// A fresh book with nothing consumed.
    pub fn new(owner_id: impl Into<String>, total_credits: u32) -> Self {
        VoucherBook {
            id: VoucherBookId::new(),
            owner_id: owner_id.into(),
            total_credits,
            used_credits: 0,
        }
    }

    /// Rebuild a book from stored fields. `used_credits` is clamped to `total_credits`.
    pub fn from_parts(
        id: VoucherBookId,
        owner_id: impl Into<String>,
        total_credits: u32,
        used_credits: u32,
    ) -> Self {
        VoucherBook {
            id,
            owner_id: owner_id.into(),
            total_credits,
            used_credits: used_credits.min(total_credits),
        }
    }

    pub fn id(&self) -> VoucherBookId {
        self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn total_credits(&self) -> u32 {
        self.total_credits
    }

    pub fn used_credits(&self) -> u32 {
        self.used_credits
    }

    pub fn remaining(&self) -> u32 {
        self.total_credits.saturating_sub(self.used_credits)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume one credit in place. Only storage backends call this, inside their
    /// atomic section.
    pub(crate) fn consume_one(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.used_credits += 1;
        Some(self.used_credits)
    }
}
