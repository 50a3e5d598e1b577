use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use domain::{PeripheralAddress, PrinterError, SerialLink, SerialTransport};
use tracing::debug;

#[derive(Debug, Default)]
struct MockState {
    known: HashSet<PeripheralAddress>,
    next_link_id: u64,
    current_link: Option<u64>,
    dead_links: HashSet<u64>,
    broken_links: HashSet<u64>,
    open_attempts: Vec<PeripheralAddress>,
    opens: Vec<PeripheralAddress>,
    closes: usize,
    open_links: usize,
    max_open_links: usize,
    writes: Vec<Vec<u8>>,
    wire: Vec<u8>,
    fail_connects: usize,
    fail_writes: usize,
    connect_delay: Duration,
}

/// In-memory transport that records every open, close and write.
///
/// Writes land on a shared "wire" in small chunks with a yield in between,
/// so unsynchronized concurrent writers would visibly interleave.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    chunk_size: usize,
}

/// Observer and fault injector for a [`MockTransport`]
#[derive(Clone)]
pub struct MockTransportProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Only `known` addresses can be opened; others are `DeviceNotFound`.
    pub fn new(known: impl IntoIterator<Item = PeripheralAddress>) -> Self {
        let state = MockState {
            known: known.into_iter().collect(),
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            chunk_size: 2,
        }
    }

    pub fn probe(&self) -> MockTransportProbe {
        MockTransportProbe {
            state: self.state.clone(),
        }
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // A panicking test thread must not cascade into every other assertion
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SerialTransport for MockTransport {
    async fn open(&self, address: &PeripheralAddress) -> Result<Box<dyn SerialLink>, PrinterError> {
        let delay = {
            let mut state = lock(&self.state);
            state.open_attempts.push(address.clone());
            state.connect_delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(PrinterError::ConnectFailed(format!(
                "{}: simulated connection failure",
                address
            )));
        }
        if !state.known.contains(address) {
            return Err(PrinterError::DeviceNotFound(format!("{} is not paired", address)));
        }

        let id = state.next_link_id;
        state.next_link_id += 1;
        state.current_link = Some(id);
        state.opens.push(address.clone());
        state.open_links += 1;
        state.max_open_links = state.max_open_links.max(state.open_links);
        debug!(address = %address, link = id, "Mock link opened");

        Ok(Box::new(MockLink {
            id,
            address: address.clone(),
            state: self.state.clone(),
            chunk_size: self.chunk_size,
            closed: false,
        }))
    }
}

struct MockLink {
    id: u64,
    address: PeripheralAddress,
    state: Arc<Mutex<MockState>>,
    chunk_size: usize,
    closed: bool,
}

impl MockLink {
    fn release(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        let mut state = lock(&self.state);
        state.open_links = state.open_links.saturating_sub(1);
        true
    }
}

#[async_trait]
impl SerialLink for MockLink {
    fn address(&self) -> &PeripheralAddress {
        &self.address
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        if self.closed {
            return Err(PrinterError::NotConnected);
        }

        {
            let mut state = lock(&self.state);
            if state.fail_writes > 0 {
                state.fail_writes -= 1;
                return Err(PrinterError::WriteFailed("simulated write failure".to_string()));
            }
            if state.dead_links.contains(&self.id) || state.broken_links.contains(&self.id) {
                return Err(PrinterError::WriteFailed("Broken pipe".to_string()));
            }
        }

        for chunk in bytes.chunks(self.chunk_size.max(1)) {
            lock(&self.state).wire.extend_from_slice(chunk);
            tokio::task::yield_now().await;
        }

        lock(&self.state).writes.push(bytes.to_vec());
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.closed && !lock(&self.state).dead_links.contains(&self.id)
    }

    async fn close(&mut self) {
        if self.release() {
            lock(&self.state).closes += 1;
            debug!(address = %self.address, link = self.id, "Mock link closed");
        }
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.release();
    }
}

impl MockTransportProbe {
    /// Every open call, successful or not
    pub fn open_attempts(&self) -> Vec<PeripheralAddress> {
        lock(&self.state).open_attempts.clone()
    }

    /// Successful opens only
    pub fn opens(&self) -> Vec<PeripheralAddress> {
        lock(&self.state).opens.clone()
    }

    pub fn closes(&self) -> usize {
        lock(&self.state).closes
    }

    pub fn open_links(&self) -> usize {
        lock(&self.state).open_links
    }

    pub fn max_open_links(&self) -> usize {
        lock(&self.state).max_open_links
    }

    /// One entry per completed write call
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    /// All bytes in the order they reached the peer
    pub fn wire(&self) -> Vec<u8> {
        lock(&self.state).wire.clone()
    }

    pub fn fail_next_connects(&self, n: usize) {
        lock(&self.state).fail_connects = n;
    }

    pub fn fail_next_writes(&self, n: usize) {
        lock(&self.state).fail_writes = n;
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        lock(&self.state).connect_delay = delay;
    }

    /// Current link dies silently: liveness reports false, writes fail.
    pub fn kill_current(&self) {
        let mut state = lock(&self.state);
        if let Some(id) = state.current_link {
            state.dead_links.insert(id);
        }
    }

    /// Peer closed without the platform noticing: liveness stays true, writes fail.
    pub fn break_current(&self) {
        let mut state = lock(&self.state);
        if let Some(id) = state.current_link {
            state.broken_links.insert(id);
        }
    }
}
