//! Voucher books, their redemption records and the identifiers tying them together.

mod ids;
mod redemption_record;
mod voucher_book;

pub use ids::{RedemptionId, VoucherBookId};
pub use redemption_record::RedemptionRecord;
pub use voucher_book::VoucherBook;
