//! The QR payload: what the holder's screen displays and staff devices scan.
//!
//! The transport string is a compact JSON object:
//!
//! ```text
//! {"t":"voucher-book","id":"<book uuid>","ts":<issued at, ms since epoch>[,"sig":"<hmac>"]}
//! ```
//!
//! Signing is optional. Without a secret the payload is plain and replayable,
//! so callers that need single-use codes must configure a [`TokenSigner`] and
//! a short freshness window on the engine.

mod codec;
mod error;
mod signer;

pub use codec::{RedemptionToken, TokenCodec, VOUCHER_BOOK_KIND};
pub use error::DecodeError;
pub use signer::TokenSigner;
