use quicktx::simulator::SimulatedNic;
use quicktx::system::ERR_NOT_RUNNING;
use quicktx::{spawn, QuickTxBuilder, QuickTxError, TxConfig, XmitStatus};
use std::thread;
use std::time::{Duration, Instant};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_drain_waits_for_held_frames() {
    init_logger();

    // 1. Device holds both frames
    let nic = SimulatedNic::new();
    let ctl = nic.control();
    ctl.set_hold(true);
    let config = TxConfig::default()
        .drain_backoff(Duration::from_millis(5))
        .drain_max_attempts(10_000);
    let (mut producer, worker) = QuickTxBuilder::new()
        .ring_capacity(8)
        .dma_blocks(2048, 4)
        .config(config)
        .build(nic)
        .unwrap();

    producer.send(0, 0, &[0xaa; 100]).unwrap();
    producer.send(1, 0, &[0xbb; 100]).unwrap();
    producer.notify();
    let handle = spawn(worker).unwrap();
    wait_for("both frames on the wire", || ctl.in_flight() == 2);

    // 2. Shutdown while both are still held
    handle.control().request_shutdown();
    thread::sleep(Duration::from_millis(50));
    assert!(!handle.is_finished());

    ctl.complete(1);
    thread::sleep(Duration::from_millis(20));
    assert!(!handle.is_finished());
    assert!(!producer.blocks().is_idle(1));

    // 3. Last completion lets the drain finish
    ctl.complete(1);
    let snapshot = handle.join().unwrap();

    assert_eq!(snapshot.ok_packets, 2);
    assert_eq!(snapshot.ok_bytes, 200);
    assert_eq!(snapshot.allocs, 2);
    assert_eq!(snapshot.freed, 2);
    assert!(producer.blocks().is_idle(0));
    assert!(producer.blocks().is_idle(1));
}

#[test]
fn test_drain_flushes_queued_frames() {
    init_logger();

    let nic = SimulatedNic::new();
    let ctl = nic.control();
    // More refusals than one submit may spend
    ctl.script([XmitStatus::Busy; 20]);
    let (mut producer, mut worker) = QuickTxBuilder::new()
        .ring_capacity(8)
        .dma_blocks(2048, 4)
        .config(TxConfig::default().submit_budget(2).sleep_budget(1))
        .build(nic)
        .unwrap();

    for block in 0..3u32 {
        producer.send(block, 0, &[block as u8; 80]).unwrap();
    }
    producer.control().request_shutdown();

    let snapshot = worker.run().unwrap();
    assert_eq!(snapshot.ok_packets, 3);
    assert_eq!(snapshot.busy, 20);
    assert_eq!(worker.pool().queued_len(), 0);
    assert_eq!(worker.pool().wait_len(), 0);
    assert_eq!(worker.pool().freed_len(), 0);
    assert_eq!(worker.pool().live(), 0);

    let seqs: Vec<u64> = ctl.sent().iter().map(|f| f.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}

#[test]
fn test_drain_timeout_force_clears() {
    init_logger();

    let nic = SimulatedNic::new();
    let ctl = nic.control();
    ctl.set_hold(true);
    let config = TxConfig::default()
        .drain_backoff(Duration::from_millis(1))
        .drain_max_attempts(5);
    let (mut producer, mut worker) = QuickTxBuilder::new()
        .ring_capacity(4)
        .dma_blocks(2048, 2)
        .config(config)
        .build(nic)
        .unwrap();

    producer.send(0, 0, &[1; 64]).unwrap();
    producer.control().request_shutdown();

    let snapshot = worker.run().unwrap();
    assert_eq!(snapshot.ok_packets, 1);
    assert_eq!(worker.pool().live(), 0);

    // The block stays pinned until the device lets go
    assert!(!producer.block_reusable(0));
    ctl.complete_all();
    assert!(producer.block_reusable(0));
}

#[test]
fn test_unusable_device_is_fatal() {
    init_logger();

    let nic = SimulatedNic::new();
    let ctl = nic.control();
    ctl.set_usable(false);
    let (mut producer, worker) = QuickTxBuilder::new()
        .ring_capacity(4)
        .dma_blocks(2048, 2)
        .build(nic)
        .unwrap();
    producer.send(0, 0, &[1; 64]).unwrap();

    let control = producer.control().clone();
    let handle = spawn(worker).unwrap();
    assert!(matches!(handle.join(), Err(QuickTxError::DeviceUnusable(_))));

    assert_eq!(control.error_flags() & ERR_NOT_RUNNING, ERR_NOT_RUNNING);
    assert_eq!(ctl.attempts(), 0);
    // The descriptor was never consumed
    assert!(!producer.block_reusable(0));
    assert!(producer.blocks().is_idle(0));
}
