use std::sync::Arc;

use hmac::digest::InvalidLength;
use serde::{Deserialize, Serialize};

use super::error::DecodeError;
use super::signer::TokenSigner;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::model::VoucherBookId;

/// Kind tag carried by every voucher-book payload.
pub const VOUCHER_BOOK_KIND: &str = "voucher-book";

/// A decoded, structurally valid redemption token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionToken {
    pub kind: String,
    pub voucher_book_id: VoucherBookId,
    /// Milliseconds since the Unix epoch at which the token was generated.
    pub issued_at: u64,
}

#[derive(Serialize, Deserialize)]
struct WirePayload {
    t: String,
    id: String,
    ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sig: Option<String>,
}

impl WirePayload {
    fn signing_input(&self) -> String {
        format!("{}|{}|{}", self.t, self.id, self.ts)
    }
}

/// Encodes book identifiers into scannable strings and validates scanned strings.
///
/// Decoding checks structure, kind and (when a signer is present) the
/// signature. It does not check freshness; the engine owns that policy.
#[derive(Clone)]
pub struct TokenCodec {
    signer: Option<TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCodec {
    /// An unsigned codec stamped with the system clock.
    pub fn new() -> Self {
        TokenCodec {
            signer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// A codec that signs and verifies with `config.token_secret`, if set.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, InvalidLength> {
        let codec = TokenCodec::new();
        match &config.token_secret {
            Some(secret) => Ok(codec.with_signer(TokenSigner::new(secret)?)),
            None => Ok(codec),
        }
    }

    pub fn with_signer(mut self, signer: TokenSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    /// Produce the display string for `voucher_book_id`, stamped with the current time.
    pub fn encode(&self, voucher_book_id: VoucherBookId) -> String {
        self.encode_at(voucher_book_id, self.clock.now_millis())
    }

    pub fn encode_at(&self, voucher_book_id: VoucherBookId, issued_at: u64) -> String {
        let mut payload = WirePayload {
            t: VOUCHER_BOOK_KIND.to_string(),
            id: voucher_book_id.to_string(),
            ts: issued_at,
            sig: None,
        };
        if let Some(signer) = &self.signer {
            payload.sig = Some(signer.sign(&payload.signing_input()));
        }

        // A struct of strings and integers always serializes.
        serde_json::to_string(&payload).unwrap_or_default()
    }

    pub fn decode(&self, raw: &str) -> Result<RedemptionToken, DecodeError> {
        let payload: WirePayload = serde_json::from_str(raw.trim())
            .map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;

        if payload.t != VOUCHER_BOOK_KIND {
            return Err(DecodeError::WrongKind { found: payload.t });
        }

        let voucher_book_id: VoucherBookId = payload
            .id
            .parse()
            .map_err(|err: uuid::Error| DecodeError::MalformedPayload(err.to_string()))?;

        if let Some(signer) = &self.signer {
            let signature = payload.sig.as_deref().ok_or(DecodeError::MissingSignature)?;
            if !signer.verify(&payload.signing_input(), signature) {
                return Err(DecodeError::BadSignature);
            }
        }

        Ok(RedemptionToken {
            kind: payload.t,
            voucher_book_id,
            issued_at: payload.ts,
        })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("signed", &self.is_signed())
            .finish()
    }
}
