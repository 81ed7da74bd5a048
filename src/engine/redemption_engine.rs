use std::sync::Arc;

use tracing::{debug, info};

use super::{Attempt, AttemptState, FreshnessPolicy, Outcome, RejectReason};
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::store::LedgerStore;
use crate::token::{TokenCodec, VOUCHER_BOOK_KIND};

/// Turns scanned strings into committed or rejected redemptions.
pub struct RedemptionEngine<S> {
    store: S,
    codec: TokenCodec,
    freshness: FreshnessPolicy,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> RedemptionEngine<S> {
    pub fn new(store: S, codec: TokenCodec) -> Self {
        RedemptionEngine {
            store,
            codec,
            freshness: FreshnessPolicy::Disabled,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_config(mut self, config: &LedgerConfig) -> Self {
        self.freshness = FreshnessPolicy::from_max_age(config.token_max_age());
        self
    }

    pub fn with_freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Run one attempt from the raw scanned string to its terminal outcome.
    pub fn redeem(&self, raw: &str) -> Outcome {
        let mut attempt = Attempt::new(raw);
        while !attempt.is_terminal() {
            self.step(&mut attempt);
        }

        // Terminal states always carry an outcome.
        let outcome = attempt
            .outcome()
            .unwrap_or_else(|| Outcome::Rejected(RejectReason::StoreUnavailable("attempt did not finish".into())));

        match &outcome {
            Outcome::Committed {
                voucher_book_id,
                used_credits,
                total_credits,
            } => info!(book_id = %voucher_book_id, used = used_credits, total = total_credits, "redemption committed"),
            Outcome::Rejected(reason) => info!(reason = %reason, "redemption rejected"),
        }
        outcome
    }

    /// Advance `attempt` by one transition. Terminal attempts are left as they are.
    pub fn step(&self, attempt: &mut Attempt) {
        let next = match &attempt.state {
            AttemptState::Received(raw) => match self.codec.decode(raw) {
                Ok(token) => AttemptState::Decoded(token),
                Err(err) => AttemptState::Rejected(RejectReason::InvalidToken(err)),
            },
            AttemptState::Decoded(token) => {
                if token.kind != VOUCHER_BOOK_KIND {
                    AttemptState::Rejected(RejectReason::InvalidToken(
                        crate::token::DecodeError::WrongKind {
                            found: token.kind.clone(),
                        },
                    ))
                } else if !self.freshness.is_fresh(token.issued_at, self.clock.now_millis()) {
                    AttemptState::Rejected(RejectReason::Expired)
                } else {
                    AttemptState::Authorized(token.clone())
                }
            }
            AttemptState::Authorized(token) => {
                match self.store.try_consume_one(token.voucher_book_id) {
                    Ok(consumed) => AttemptState::Committed(consumed.book),
                    Err(err) => AttemptState::Rejected(RejectReason::from(err)),
                }
            }
            AttemptState::Committed(_) | AttemptState::Rejected(_) => return,
        };

        debug!(from = attempt.state.name(), to = next.name(), "redemption attempt advanced");
        attempt.state = next;
    }
}
