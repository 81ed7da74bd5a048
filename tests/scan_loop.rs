mod support;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use support::RecordingSink;
use voucher_ledger::{
    DropReason, GateState, HashMapBackend, Ledger, LedgerConfig, LedgerStore, ManualClock, Notice,
    Outcome, RedemptionEngine, ScanDisposition, ScanEvent, ScanLoopController, TokenCodec,
    VoucherBookId,
};

type Controller = ScanLoopController<Ledger<HashMapBackend>, RecordingSink>;

fn setup(total: u32) -> (Controller, RecordingSink, ManualClock, VoucherBookId) {
    let clock = ManualClock::at_millis(1_700_000_000_000);
    let ledger = Ledger::new(HashMapBackend::new());
    let book = ledger.get_or_create("holder", total).unwrap();

    let codec = TokenCodec::new().with_clock(Arc::new(clock.clone()));
    let engine = RedemptionEngine::new(ledger, codec).with_clock(Arc::new(clock.clone()));
    let sink = RecordingSink::new();
    let controller = ScanLoopController::new(engine, sink.clone())
        .with_config(&LedgerConfig::new())
        .with_clock(Arc::new(clock.clone()));

    (controller, sink, clock, book.id())
}

#[test]
fn held_code_is_redeemed_once_per_cooldown() {
    let (controller, sink, clock, id) = setup(30);
    let code = controller.engine().codec().encode(id);

    // The camera reports the same code every 100ms for one second.
    let mut dispositions = Vec::new();
    for _ in 0..10 {
        dispositions.push(controller.on_scan(ScanEvent::new(code.clone())));
        clock.advance(Duration::from_millis(100));
    }

    let processed = dispositions
        .iter()
        .filter(|d| matches!(d, ScanDisposition::Processed(_)))
        .count();
    assert_eq!(processed, 1);
    assert!(dispositions[1..]
        .iter()
        .all(|d| *d == ScanDisposition::Dropped(DropReason::CoolingDown)));

    assert_eq!(sink.shown(), vec![Notice::new("Redeemed", "Used: 1 / 30")]);
}

#[test]
fn cooldown_expires() {
    let (controller, _, clock, id) = setup(30);
    let code = controller.engine().codec().encode(id);

    controller.on_scan(ScanEvent::new(code.clone()));
    controller.dismiss_notice();

    clock.advance(Duration::from_millis(1_799));
    assert!(matches!(controller.gate_state(), GateState::Cooling { .. }));
    clock.advance(Duration::from_millis(1));
    assert_eq!(controller.gate_state(), GateState::Idle);

    assert!(matches!(
        controller.on_scan(ScanEvent::new(code)),
        ScanDisposition::Processed(Outcome::Committed { used_credits: 2, .. })
    ));
}

#[test]
fn overlapping_scans_on_one_device_run_one_attempt() {
    let (controller, _, _, id) = setup(30);
    let controller = Arc::new(controller);
    let code = controller.engine().codec().encode(id);

    let barrier = Arc::new(Barrier::new(8));
    let dispositions: Vec<ScanDisposition> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            let code = code.clone();
            thread::spawn(move || {
                barrier.wait();
                controller.on_scan(ScanEvent::new(code))
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    let processed = dispositions
        .iter()
        .filter(|d| matches!(d, ScanDisposition::Processed(_)))
        .count();
    assert_eq!(processed, 1);
    assert!(dispositions.iter().all(|d| matches!(
        d,
        ScanDisposition::Processed(_)
            | ScanDisposition::Dropped(DropReason::Busy)
            | ScanDisposition::Dropped(DropReason::CoolingDown)
    )));
    assert_eq!(
        controller.engine().store().read_balance(id).unwrap().used_credits(),
        1
    );
}

#[test]
fn only_one_notice_at_a_time() {
    let (controller, sink, clock, id) = setup(30);
    let code = controller.engine().codec().encode(id);

    controller.on_scan(ScanEvent::new(code.clone()));
    clock.advance(Duration::from_secs(2));
    controller.on_scan(ScanEvent::new("not-json"));

    assert_eq!(sink.shown().len(), 1);

    controller.dismiss_notice();
    clock.advance(Duration::from_secs(2));
    controller.on_scan(ScanEvent::new("not-json"));

    let shown = sink.shown();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].title, "Invalid code");
}

#[test]
fn run_drains_a_stream() {
    let (controller, sink, clock, id) = setup(2);
    let codec = controller.engine().codec().clone();

    // Each scan arrives after the cooldown, the notice already dismissed.
    let scans = (0..4).map(|_| {
        clock.advance(Duration::from_secs(2));
        controller.dismiss_notice();
        ScanEvent::new(codec.encode(id))
    });
    let stats = controller.run(scans);

    assert_eq!(stats.received, 4);
    assert_eq!(stats.processed, 4);
    assert_eq!(stats.committed, 2);
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.notices_shown, 4);
    assert_eq!(sink.shown().last().unwrap().message, "No balance left.");
}
