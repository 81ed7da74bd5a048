use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::{RedemptionId, VoucherBookId};

/// Append-only record of one consumed credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub id: RedemptionId,
    pub voucher_book_id: VoucherBookId,
    pub created_at: SystemTime,
}

impl RedemptionRecord {
    pub fn new(voucher_book_id: VoucherBookId, created_at: SystemTime) -> Self {
        RedemptionRecord {
            id: RedemptionId::new(),
            voucher_book_id,
            created_at,
        }
    }
}
