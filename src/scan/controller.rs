use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::{GateState, Notice, NoticeSink, NoticeSlot, ScanGate};
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::engine::{Outcome, RedemptionEngine};
use crate::store::LedgerStore;

/// One decoded code reported by the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub data: String,
}

impl ScanEvent {
    pub fn new(data: impl Into<String>) -> Self {
        ScanEvent { data: data.into() }
    }
}

/// Why a scan was dropped without a redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Busy,
    CoolingDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDisposition {
    Processed(Outcome),
    Dropped(DropReason),
}

/// Counters for a run over a stream of scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub received: usize,
    pub processed: usize,
    pub dropped_busy: usize,
    pub dropped_cooling: usize,
    pub committed: usize,
    pub rejected: usize,
    pub notices_shown: usize,
}

impl ScanStats {
    fn record(&mut self, disposition: &ScanDisposition, notice_shown: bool) {
        self.received += 1;
        match disposition {
            ScanDisposition::Processed(outcome) => {
                self.processed += 1;
                if outcome.is_committed() {
                    self.committed += 1;
                } else {
                    self.rejected += 1;
                }
            }
            ScanDisposition::Dropped(DropReason::Busy) => self.dropped_busy += 1,
            ScanDisposition::Dropped(DropReason::CoolingDown) => self.dropped_cooling += 1,
        }
        if notice_shown {
            self.notices_shown += 1;
        }
    }
}

/// Feeds scans through a [`ScanGate`] into the engine and surfaces each
/// outcome as a [`Notice`].
///
/// Scans arriving while an attempt is in flight or cooling down are dropped,
/// not queued.
pub struct ScanLoopController<S, K> {
    engine: RedemptionEngine<S>,
    sink: K,
    gate: Mutex<ScanGate>,
    notices: Arc<NoticeSlot>,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore, K: NoticeSink> ScanLoopController<S, K> {
    pub fn new(engine: RedemptionEngine<S>, sink: K) -> Self {
        ScanLoopController {
            engine,
            sink,
            gate: Mutex::new(ScanGate::new(LedgerConfig::default().scan_cooldown())),
            notices: Arc::new(NoticeSlot::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_config(self, config: &LedgerConfig) -> Self {
        self.with_gate(ScanGate::new(config.scan_cooldown()))
    }

    pub fn with_gate(mut self, gate: ScanGate) -> Self {
        self.gate = Mutex::new(gate);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share a notice slot with other parts of the display.
    pub fn with_notice_slot(mut self, notices: Arc<NoticeSlot>) -> Self {
        self.notices = notices;
        self
    }

    pub fn engine(&self) -> &RedemptionEngine<S> {
        &self.engine
    }

    pub fn notices(&self) -> &Arc<NoticeSlot> {
        &self.notices
    }

    pub fn gate_state(&self) -> GateState {
        let now = self.clock.now();
        self.lock_gate().state_at(now)
    }

    /// The user acknowledged the notice on screen.
    pub fn dismiss_notice(&self) -> Option<Notice> {
        self.notices.dismiss()
    }

    pub fn on_scan(&self, event: ScanEvent) -> ScanDisposition {
        self.handle(event).0
    }

    /// Process scans in order until the iterator ends.
    pub fn run<I>(&self, scans: I) -> ScanStats
    where
        I: IntoIterator<Item = ScanEvent>,
    {
        let mut stats = ScanStats::default();
        for event in scans {
            let (disposition, shown) = self.handle(event);
            stats.record(&disposition, shown);
        }
        stats
    }

    fn handle(&self, event: ScanEvent) -> (ScanDisposition, bool) {
        let begun = {
            let now = self.clock.now();
            self.lock_gate().try_begin(now)
        };
        if let Err(state) = begun {
            let reason = match state {
                GateState::InFlight => DropReason::Busy,
                _ => DropReason::CoolingDown,
            };
            debug!(?reason, "scan dropped");
            return (ScanDisposition::Dropped(reason), false);
        }

        // The gate lock is not held here, so concurrent scans see InFlight.
        let outcome = {
            let _cooling = CoolOnDrop { controller: self };
            self.engine.redeem(&event.data)
        };

        let shown = self.notify(&outcome);
        (ScanDisposition::Processed(outcome), shown)
    }

    fn notify(&self, outcome: &Outcome) -> bool {
        let notice = outcome.notice();
        if !self.notices.offer(notice.clone()) {
            warn!(title = %notice.title, "notice suppressed, another is still shown");
            return false;
        }
        self.sink.show(&notice);
        true
    }

    fn lock_gate(&self) -> std::sync::MutexGuard<'_, ScanGate> {
        self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Moves the gate to cooling when the attempt ends, even by unwinding.
struct CoolOnDrop<'a, S, K> {
    controller: &'a ScanLoopController<S, K>,
}

impl<S, K> Drop for CoolOnDrop<'_, S, K> {
    fn drop(&mut self) {
        let now = self.controller.clock.now();
        self.controller
            .gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .finish(now);
    }
}
