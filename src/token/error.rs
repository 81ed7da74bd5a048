use thiserror::Error;

/// Why a scanned string could not be turned into a [`RedemptionToken`](super::RedemptionToken).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("wrong payload kind: {found}")]
    WrongKind { found: String },
    #[error("token signature missing")]
    MissingSignature,
    #[error("token signature does not match")]
    BadSignature,
}
