use application::{PrinterGateway, PrinterSettings};
use async_trait::async_trait;
use domain::{
    AddressStore, ConnectionState, DrawerKick, DrawerPin, PeripheralAddress, PeripheralDescriptor,
    PrinterError,
};
use infrastructure::{MemoryAddressStore, MockTransport, MockTransportProbe, StaticDeviceRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

const KICK: [u8; 5] = [0x1B, 0x70, 0x00, 0x19, 0x78];

fn addr(s: &str) -> PeripheralAddress {
    PeripheralAddress::parse(s).unwrap()
}

fn settings() -> PrinterSettings {
    PrinterSettings {
        settle_delay: Duration::ZERO,
        ..PrinterSettings::default()
    }
}

struct Setup {
    gateway: PrinterGateway,
    probe: MockTransportProbe,
    handle: JoinHandle<()>,
}

async fn start_with(settings: PrinterSettings, store: Arc<dyn AddressStore>) -> Setup {
    let transport = MockTransport::new([addr("AA:BB"), addr("CC:DD")]);
    let probe = transport.probe();
    let registry = StaticDeviceRegistry::new(vec![
        PeripheralDescriptor::new("Counter Printer", addr("AA:BB")),
        PeripheralDescriptor::new("Kitchen Printer", addr("CC:DD")),
    ]);

    let (gateway, handle) =
        PrinterGateway::start(settings, Arc::new(transport), Arc::new(registry), store).await;

    Setup {
        gateway,
        probe,
        handle,
    }
}

async fn start() -> Setup {
    start_with(settings(), Arc::new(MemoryAddressStore::new())).await
}

// Stores nothing and fails every operation
struct BrokenStore;

#[async_trait]
impl AddressStore for BrokenStore {
    async fn load(&self) -> Result<Option<PeripheralAddress>, PrinterError> {
        Err(PrinterError::Storage("disk gone".to_string()))
    }
    async fn save(&self, _address: &PeripheralAddress) -> Result<(), PrinterError> {
        Err(PrinterError::Storage("disk gone".to_string()))
    }
    async fn clear(&self) -> Result<(), PrinterError> {
        Err(PrinterError::Storage("disk gone".to_string()))
    }
}

#[tokio::test]
async fn test_fresh_process_drawer_kick_is_not_connected() {
    let s = start().await;

    let result = s.gateway.open_cash_drawer().await;

    assert_eq!(result, Err(PrinterError::NotConnected));
    assert!(s.probe.open_attempts().is_empty(), "No socket open without an address");
    assert_eq!(s.gateway.last_known_address().await.unwrap(), None);
}

#[tokio::test]
async fn test_connect_success() {
    let s = start().await;
    let mut status = s.gateway.connection_status();

    assert_eq!(s.gateway.connect(addr("AA:BB")).await, Ok(true));

    assert!(s.gateway.is_connected());
    assert_eq!(s.gateway.state(), ConnectionState::Connected);
    assert_eq!(
        s.gateway.last_known_address().await.unwrap(),
        Some(addr("AA:BB"))
    );
    assert_eq!(status.next().await, Some(true));
}

#[tokio::test]
async fn test_failed_connect_leaves_last_known_unchanged() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    s.probe.fail_next_connects(1);
    let result = s.gateway.connect(addr("CC:DD")).await;

    assert!(matches!(result, Err(PrinterError::ConnectFailed(_))));
    assert!(!s.gateway.is_connected());
    assert_eq!(
        s.gateway.last_known_address().await.unwrap(),
        Some(addr("AA:BB"))
    );
    // Not retried automatically
    assert_eq!(s.probe.open_attempts().len(), 2);
}

#[tokio::test]
async fn test_connect_unknown_device() {
    let s = start().await;
    let result = s.gateway.connect(addr("EE:FF")).await;
    assert!(matches!(result, Err(PrinterError::DeviceNotFound(_))));
    assert_eq!(s.gateway.last_known_address().await.unwrap(), None);
}

#[tokio::test]
async fn test_disconnect_emits_single_false() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();
    let mut status = s.gateway.connection_status();

    s.gateway.disconnect().await.unwrap();
    assert!(!s.gateway.is_connected());

    // Idempotent: a second disconnect changes nothing
    s.gateway.disconnect().await.unwrap();

    assert_eq!(status.next().await, Some(false));
    let extra = tokio::time::timeout(Duration::from_millis(50), status.next()).await;
    assert!(extra.is_err(), "Expected exactly one status event");
    assert_eq!(s.probe.closes(), 1);
}

#[tokio::test]
async fn test_silent_link_death_reconnects_once_then_writes() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    s.probe.kill_current();
    let result = s.gateway.send_bytes(vec![0x1B, 0x40]).await;

    assert_eq!(result, Ok(()));
    assert_eq!(s.probe.opens(), vec![addr("AA:BB"), addr("AA:BB")]);
    assert_eq!(s.probe.closes(), 1);
    assert_eq!(s.probe.writes(), vec![vec![0x1B, 0x40]]);
    assert!(s.gateway.is_connected());
}

#[tokio::test]
async fn test_silent_link_death_with_failed_reopen() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    s.probe.kill_current();
    s.probe.fail_next_connects(1);
    let result = s.gateway.send_bytes(vec![0x1B, 0x40]).await;

    assert_eq!(result, Err(PrinterError::NotConnected));
    assert!(s.probe.writes().is_empty());
    assert_eq!(
        s.gateway.last_known_address().await.unwrap(),
        Some(addr("AA:BB"))
    );

    // The next command retries the reopen
    assert_eq!(s.gateway.send_bytes(vec![0x1B, 0x40]).await, Ok(()));
    assert_eq!(s.probe.opens().len(), 2);
}

#[tokio::test]
async fn test_live_link_is_reused() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    for _ in 0..3 {
        s.gateway.send_bytes(b"line\n".to_vec()).await.unwrap();
    }
    s.gateway.open_cash_drawer().await.unwrap();
    s.gateway.open_cash_drawer().await.unwrap();

    assert_eq!(s.probe.opens().len(), 1);
    assert_eq!(s.probe.closes(), 0);
}

#[tokio::test]
async fn test_drawer_kick_is_one_write() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    s.gateway.open_cash_drawer().await.unwrap();

    assert_eq!(s.probe.writes(), vec![KICK.to_vec()]);
}

#[tokio::test]
async fn test_drawer_kick_with_pin5() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    s.gateway
        .open_cash_drawer_with(DrawerKick::with_pin(DrawerPin::Pin5))
        .await
        .unwrap();

    assert_eq!(s.probe.writes(), vec![vec![0x1B, 0x70, 0x01, 0x19, 0x78]]);
}

#[tokio::test]
async fn test_drawer_kick_reconnects_stale_link_and_writes_once() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    s.probe.kill_current();
    s.gateway.open_cash_drawer().await.unwrap();

    assert_eq!(s.probe.opens().len(), 2);
    assert_eq!(s.probe.writes(), vec![KICK.to_vec()]);
}

#[tokio::test]
async fn test_write_failure_is_not_retried() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    // Platform still says alive, the pipe is broken
    s.probe.break_current();
    let result = s.gateway.open_cash_drawer().await;

    assert!(matches!(result, Err(PrinterError::WriteFailed(_))));
    assert!(s.probe.writes().is_empty());
    assert_eq!(s.probe.open_attempts().len(), 1, "No reconnect after a failed write");
    assert!(!s.gateway.is_connected());

    // Caller may resubmit; the dead link is replaced lazily
    s.gateway.open_cash_drawer().await.unwrap();
    assert_eq!(s.probe.writes(), vec![KICK.to_vec()]);
    assert_eq!(s.probe.opens().len(), 2);
}

#[tokio::test]
async fn test_concurrent_writes_do_not_interleave() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    let first = vec![0xAA; 64];
    let second = vec![0xBB; 64];
    let g1 = s.gateway.clone();
    let g2 = s.gateway.clone();
    let (a, b) = (first.clone(), second.clone());

    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { g1.send_bytes(a).await }),
        tokio::spawn(async move { g2.send_bytes(b).await }),
    );
    assert_eq!(r1.unwrap(), Ok(()));
    assert_eq!(r2.unwrap(), Ok(()));

    let wire = s.probe.wire();
    let ab = [first.clone(), second.clone()].concat();
    let ba = [second, first].concat();
    assert!(wire == ab || wire == ba, "Buffers interleaved on the wire");
}

#[tokio::test]
async fn test_at_most_one_link() {
    let s = start().await;
    s.probe.set_connect_delay(Duration::from_millis(5));

    s.gateway.connect(addr("AA:BB")).await.unwrap();
    s.gateway.connect(addr("CC:DD")).await.unwrap();
    s.gateway.connect(addr("AA:BB")).await.unwrap();
    s.gateway.disconnect().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let gateway = s.gateway.clone();
        let target = if i % 2 == 0 { addr("AA:BB") } else { addr("CC:DD") };
        handles.push(tokio::spawn(async move {
            gateway.connect(target).await.unwrap();
            gateway.send_bytes(vec![i]).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(s.probe.max_open_links(), 1);
    assert_eq!(s.probe.open_links(), 1);
}

#[tokio::test]
async fn test_forget_clears_address() {
    let store = Arc::new(MemoryAddressStore::new());
    let s = start_with(settings(), store.clone()).await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();
    assert_eq!(store.load().await.unwrap(), Some(addr("AA:BB")));

    s.gateway.forget().await.unwrap();

    assert!(!s.gateway.is_connected());
    assert_eq!(s.gateway.last_known_address().await.unwrap(), None);
    assert_eq!(store.load().await.unwrap(), None);
    assert_eq!(
        s.gateway.send_bytes(vec![0x0A]).await,
        Err(PrinterError::NotConnected)
    );
    assert_eq!(s.probe.open_attempts().len(), 1);
}

#[tokio::test]
async fn test_persisted_address_reconnects_on_cold_start() {
    let store = Arc::new(MemoryAddressStore::with_address(addr("CC:DD")));
    let s = start_with(settings(), store).await;

    assert!(!s.gateway.is_connected());
    s.gateway.send_bytes(vec![0x1B, 0x40]).await.unwrap();

    assert_eq!(s.probe.opens(), vec![addr("CC:DD")]);
    assert!(s.gateway.is_connected());
}

#[tokio::test]
async fn test_ensure_connected_opens_without_writing() {
    let store = Arc::new(MemoryAddressStore::with_address(addr("CC:DD")));
    let s = start_with(settings(), store).await;

    assert_eq!(s.gateway.ensure_connected().await, Ok(true));
    assert_eq!(s.probe.opens(), vec![addr("CC:DD")]);
    assert!(s.probe.writes().is_empty());
    assert!(s.gateway.is_connected());

    // Live link: no second open
    assert_eq!(s.gateway.ensure_connected().await, Ok(true));
    assert_eq!(s.probe.opens().len(), 1);
}

#[tokio::test]
async fn test_ensure_connected_without_known_printer() {
    let s = start().await;

    assert_eq!(s.gateway.ensure_connected().await, Ok(false));
    assert!(s.probe.open_attempts().is_empty());
    assert!(!s.gateway.is_connected());
}

#[tokio::test]
async fn test_configured_default_address_seeds_empty_store() {
    let settings = PrinterSettings {
        default_address: Some(addr("AA:BB")),
        ..settings()
    };
    let s = start_with(settings, Arc::new(MemoryAddressStore::new())).await;

    assert_eq!(
        s.gateway.last_known_address().await.unwrap(),
        Some(addr("AA:BB"))
    );
}

#[tokio::test]
async fn test_store_failures_never_fail_connect() {
    let s = start_with(settings(), Arc::new(BrokenStore)).await;

    assert_eq!(s.gateway.connect(addr("AA:BB")).await, Ok(true));
    s.gateway.forget().await.unwrap();
    assert!(!s.gateway.is_connected());
}

#[tokio::test]
async fn test_list_paired_devices() {
    let s = start().await;
    let devices = s.gateway.list_paired_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].name, "Counter Printer");
    assert!(s.probe.open_attempts().is_empty());
}

#[tokio::test]
async fn test_shutdown_closes_link() {
    let s = start().await;
    s.gateway.connect(addr("AA:BB")).await.unwrap();
    let mut status = s.gateway.connection_status();

    s.gateway.shutdown();
    s.handle.await.unwrap();

    assert_eq!(s.probe.open_links(), 0);
    assert_eq!(s.probe.closes(), 1);
    assert_eq!(status.next().await, Some(false));
    assert_eq!(
        s.gateway.send_bytes(vec![0x0A]).await,
        Err(PrinterError::ChannelClosed)
    );
}

#[tokio::test]
async fn test_dropping_all_handles_releases_link() {
    let Setup {
        gateway,
        probe,
        handle,
    } = start().await;
    gateway.connect(addr("AA:BB")).await.unwrap();

    drop(gateway);
    handle.await.unwrap();

    assert_eq!(probe.open_links(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_settle_delay_before_connected() {
    let settings = PrinterSettings {
        settle_delay: Duration::from_millis(500),
        ..PrinterSettings::default()
    };
    let s = start_with(settings, Arc::new(MemoryAddressStore::new())).await;

    let started = tokio::time::Instant::now();
    s.gateway.connect(addr("AA:BB")).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(s.gateway.is_connected());
}

#[tokio::test]
async fn test_status_stream_through_reconnect() {
    let s = start().await;
    let mut status = s.gateway.connection_status();

    s.gateway.connect(addr("AA:BB")).await.unwrap();
    s.probe.kill_current();
    s.gateway.send_bytes(vec![0x0A]).await.unwrap();
    s.gateway.disconnect().await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(status.next().await.unwrap());
    }
    assert_eq!(seen, vec![true, false, true, false]);
}

#[tokio::test]
async fn test_event_snapshots_track_state() {
    let s = start().await;
    let mut events = s.gateway.subscribe_events();
    assert_eq!(events.borrow().state, ConnectionState::Disconnected);

    s.gateway.connect(addr("AA:BB")).await.unwrap();
    events.changed().await.unwrap();

    let snapshot = events.borrow_and_update().clone();
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.address, Some(addr("AA:BB")));
}
