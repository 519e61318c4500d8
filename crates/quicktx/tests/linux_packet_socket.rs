#[cfg(target_os = "linux")]
mod linux_packet_socket {
    use quicktx::{spawn, QuickTxBuilder, QuickTxError, TxConfig};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_loopback_transmit() {
        let _ = env_logger::builder().is_test(true).try_init();

        // 1. Needs CAP_NET_RAW and a running lo
        let (mut producer, worker) = match QuickTxBuilder::new()
            .ring_capacity(16)
            .dma_blocks(2048, 4)
            .config(TxConfig::default().drain_backoff(Duration::from_millis(10)))
            .build_socket("lo")
        {
            Ok(pair) => pair,
            Err(QuickTxError::Io(e)) => {
                eprintln!("skipping, cannot open AF_PACKET socket: {}", e);
                return;
            }
            Err(e) => panic!("unexpected error: {}", e),
        };

        // 2. Broadcast ethernet frame with a local experimental ethertype
        let mut frame = vec![0u8; 60];
        frame[..6].copy_from_slice(&[0xff; 6]);
        frame[6..12].copy_from_slice(&[0x02, 0, 0, 0, 0, 1]);
        frame[12..14].copy_from_slice(&0x88b5u16.to_be_bytes());

        for block in 0..4u32 {
            producer.send(block, 0, &frame).unwrap();
        }
        producer.notify();

        let handle = spawn(worker).unwrap();
        thread::sleep(Duration::from_millis(50));

        match handle.shutdown() {
            Ok(snapshot) => {
                assert_eq!(snapshot.consumed, 4);
                assert_eq!(snapshot.ok_packets, 4);
            }
            // lo is down in this namespace
            Err(QuickTxError::DeviceUnusable(_)) => {}
            Err(e) => panic!("worker failed: {}", e),
        }
    }
}
