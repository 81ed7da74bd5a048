use std::time::{Duration, SystemTime};

/// State of the scan gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Ready for the next scan.
    Idle,
    /// A redemption attempt is running.
    InFlight,
    /// Ignoring scans until `until`, so the code still in frame is not re-read.
    Cooling { until: SystemTime },
}

/// `Idle → InFlight → Cooling → Idle` automaton. The cooling-to-idle timer is
/// evaluated lazily against the time passed in.
#[derive(Debug, Clone)]
pub struct ScanGate {
    state: GateState,
    cooldown: Duration,
}

impl ScanGate {
    pub fn new(cooldown: Duration) -> Self {
        ScanGate {
            state: GateState::Idle,
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// State as of `now`, applying an expired cooldown.
    pub fn state_at(&mut self, now: SystemTime) -> GateState {
        if let GateState::Cooling { until } = self.state {
            if now >= until {
                self.state = GateState::Idle;
            }
        }
        self.state
    }

    /// Claim the gate for a new attempt. On refusal returns the blocking state.
    pub fn try_begin(&mut self, now: SystemTime) -> Result<(), GateState> {
        match self.state_at(now) {
            GateState::Idle => {
                self.state = GateState::InFlight;
                Ok(())
            }
            blocking => Err(blocking),
        }
    }

    /// The in-flight attempt reached a terminal outcome; start cooling.
    pub fn finish(&mut self, now: SystemTime) {
        if self.state == GateState::InFlight {
            self.state = GateState::Cooling {
                until: now + self.cooldown,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    #[test]
    fn full_cycle() {
        let mut gate = ScanGate::new(Duration::from_millis(1_800));
        assert_eq!(gate.state_at(at(0)), GateState::Idle);

        gate.try_begin(at(0)).unwrap();
        assert_eq!(gate.try_begin(at(10)), Err(GateState::InFlight));

        gate.finish(at(100));
        assert_eq!(
            gate.try_begin(at(1_899)),
            Err(GateState::Cooling { until: at(1_900) })
        );

        assert!(gate.try_begin(at(1_900)).is_ok());
    }

    #[test]
    fn finish_without_begin_is_ignored() {
        let mut gate = ScanGate::new(Duration::from_secs(1));
        gate.finish(at(0));
        assert_eq!(gate.state_at(at(0)), GateState::Idle);
    }

    #[test]
    fn zero_cooldown_reopens_immediately() {
        let mut gate = ScanGate::new(Duration::ZERO);
        gate.try_begin(at(5)).unwrap();
        gate.finish(at(5));
        assert!(gate.try_begin(at(5)).is_ok());
    }
}
