use std::time::Duration;

/// How old a token may be when it is redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreshnessPolicy {
    #[default]
    Disabled,
    /// Reject tokens issued more than this long ago, or this far in the future.
    MaxAge(Duration),
}

impl FreshnessPolicy {
    pub fn from_max_age(max_age: Option<Duration>) -> Self {
        max_age.map_or(FreshnessPolicy::Disabled, FreshnessPolicy::MaxAge)
    }

    pub fn is_fresh(&self, issued_at_ms: u64, now_ms: u64) -> bool {
        match self {
            FreshnessPolicy::Disabled => true,
            FreshnessPolicy::MaxAge(max_age) => {
                let window = max_age.as_millis() as u64;
                issued_at_ms.abs_diff(now_ms) <= window
            }
        }
    }
}
