use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables shared by the ledger, the engine and the scan loop.
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```
/// use voucher_ledger::LedgerConfig;
///
/// let config = LedgerConfig::from_json(r#"{ "scan_cooldown_ms": 500 }"#).unwrap();
/// assert_eq!(config.scan_cooldown_ms, 500);
/// assert_eq!(config.default_total_credits, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Credits given to a book created lazily for a new owner.
    pub default_total_credits: u32,
    /// How long new scans are ignored after a terminal outcome.
    pub scan_cooldown_ms: u64,
    /// Maximum token age; `None` disables the freshness check.
    pub token_max_age_ms: Option<u64>,
    /// Bound on optimistic retries for a single store operation.
    pub max_cas_retries: u32,
    /// When set, issued tokens are signed and decoded tokens must carry a valid signature.
    pub token_secret: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            default_total_credits: 30,
            scan_cooldown_ms: 1_800,
            token_max_age_ms: None,
            max_cas_retries: 16,
            token_secret: None,
        }
    }
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    pub fn with_default_total_credits(mut self, total: u32) -> Self {
        self.default_total_credits = total;
        self
    }

    pub fn with_scan_cooldown(mut self, cooldown: Duration) -> Self {
        self.scan_cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn with_token_max_age(mut self, max_age: Duration) -> Self {
        self.token_max_age_ms = Some(max_age.as_millis() as u64);
        self
    }

    pub fn with_max_cas_retries(mut self, retries: u32) -> Self {
        self.max_cas_retries = retries;
        self
    }

    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token_secret = Some(secret.into());
        self
    }

    pub fn scan_cooldown(&self) -> Duration {
        Duration::from_millis(self.scan_cooldown_ms)
    }

    pub fn token_max_age(&self) -> Option<Duration> {
        self.token_max_age_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.default_total_credits, 30);
        assert_eq!(config.scan_cooldown(), Duration::from_millis(1_800));
        assert!(config.token_max_age().is_none());
        assert!(config.token_secret.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = LedgerConfig::new()
            .with_default_total_credits(10)
            .with_scan_cooldown(Duration::from_secs(2))
            .with_token_max_age(Duration::from_secs(60))
            .with_max_cas_retries(3)
            .with_token_secret("s3cret");

        assert_eq!(config.default_total_credits, 10);
        assert_eq!(config.scan_cooldown_ms, 2_000);
        assert_eq!(config.token_max_age_ms, Some(60_000));
        assert_eq!(config.max_cas_retries, 3);
        assert_eq!(config.token_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn json_round_trip_keeps_unset_defaults() {
        let config = LedgerConfig::from_json(r#"{"token_max_age_ms": 30000}"#).unwrap();
        assert_eq!(config.token_max_age(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_cas_retries, 16);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(LedgerConfig::from_json("{ nope").is_err());
    }
}
