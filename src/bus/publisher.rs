use thiserror::Error;

/// An event to be published to the bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Unique identifier for this event
    pub id: String,
    /// Event type (e.g. "BalanceChanged")
    pub event_type: String,
    /// Bitcode-serialized payload
    pub payload: Vec<u8>,
}

impl Event {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// Create an event with bitcode-serialized payload.
    pub fn encode<T: serde::Serialize>(
        id: impl Into<String>,
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, PublishError> {
        let bytes = bitcode::serialize(payload)
            .map_err(|err| PublishError::SerializationFailed(err.to_string()))?;
        Ok(Self::new(id, event_type, bytes))
    }

    /// Decode the payload from bitcode binary format.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, PublishError> {
        bitcode::deserialize(&self.payload)
            .map_err(|err| PublishError::SerializationFailed(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The transport is gone or unreachable.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

/// Publishing side of the bus.
///
/// Implementations must not block on slow consumers; the ledger calls
/// `publish` while committing.
pub trait Publisher: Send + Sync {
    fn publish(&self, event: Event) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        book: String,
        used: u32,
    }

    #[test]
    fn encode_decode_payload() {
        let payload = Payload {
            book: "b-1".into(),
            used: 3,
        };
        let event = Event::encode("evt-1", "BalanceChanged", &payload).unwrap();
        assert_eq!(event.event_type, "BalanceChanged");
        assert_eq!(event.decode::<Payload>().unwrap(), payload);
    }

    #[test]
    fn decode_garbage_fails() {
        let event = Event::new("evt-1", "BalanceChanged", vec![0xff]);
        assert!(matches!(
            event.decode::<Payload>(),
            Err(PublishError::SerializationFailed(_))
        ));
    }
}
