use std::sync::Arc;
use std::time::Duration;

use domain::store::resolve_last_known;
use domain::{
    AddressStore, ConnectionEvent, ConnectionState, DeviceRegistry, DrawerKick, PeripheralAddress,
    PeripheralDescriptor, PrinterError, SerialTransport,
};
use infrastructure::BridgeConfig;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::actor::{PrinterActor, PrinterCommand};
use super::connection_manager::ConnectionManager;
use super::dispatcher::CommandDispatcher;

#[derive(Debug, Clone, PartialEq)]
pub struct PrinterSettings {
    /// Pause after a link opens before it is used
    pub settle_delay: Duration,
    pub drawer: DrawerKick,
    /// Used when the address store holds nothing
    pub default_address: Option<PeripheralAddress>,
    pub status_buffer: usize,
    pub mailbox: usize,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            drawer: DrawerKick::default(),
            default_address: None,
            status_buffer: 16,
            mailbox: 32,
        }
    }
}

impl PrinterSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            settle_delay: config.printer.settle_delay(),
            drawer: config.printer.drawer.kick(),
            default_address: config.printer.default_address.clone(),
            status_buffer: config.status_buffer.max(1),
            ..Self::default()
        }
    }
}

/// The boundary callers talk to. Cheap to clone; every clone feeds the same
/// printer actor, so operations from any number of tasks are serialized.
#[derive(Clone)]
pub struct PrinterGateway {
    tx: mpsc::Sender<PrinterCommand>,
    registry: Arc<dyn DeviceRegistry>,
    status_tx: broadcast::Sender<bool>,
    events: watch::Receiver<ConnectionEvent>,
    cancel_token: CancellationToken,
}

impl PrinterGateway {
    /// Spawn the printer actor and return a handle to it.
    ///
    /// The last known address is loaded from `store`, falling back to
    /// `settings.default_address`.
    pub async fn start(
        settings: PrinterSettings,
        transport: Arc<dyn SerialTransport>,
        registry: Arc<dyn DeviceRegistry>,
        store: Arc<dyn AddressStore>,
    ) -> (Self, JoinHandle<()>) {
        let configured = settings.default_address.clone();
        let last_known = match resolve_last_known(store.as_ref(), configured.clone()).await {
            Ok(address) => address,
            Err(e) => {
                warn!(error = %e, "Could not load last known printer, using configured default");
                configured
            }
        };
        if let Some(address) = &last_known {
            info!(address = %address, "Last known printer");
        }

        let (status_tx, _) = broadcast::channel(settings.status_buffer.max(1));
        let (event_tx, events) = watch::channel(ConnectionEvent::initial());
        let (tx, rx) = mpsc::channel(settings.mailbox.max(1));
        let cancel_token = CancellationToken::new();

        let manager = ConnectionManager::new(
            transport,
            store,
            last_known,
            settings.settle_delay,
            status_tx.clone(),
            event_tx,
        );
        let dispatcher = CommandDispatcher::new(manager, settings.drawer);
        let actor = PrinterActor::new(dispatcher, rx, cancel_token.clone());
        let handle = tokio::spawn(actor.run());

        (
            Self {
                tx,
                registry,
                status_tx,
                events,
                cancel_token,
            },
            handle,
        )
    }

    /// Bonded peripherals. Pure query, not serialized with link operations.
    pub async fn list_paired_devices(&self) -> Result<Vec<PeripheralDescriptor>, PrinterError> {
        self.registry.list_paired_devices().await
    }

    /// Explicit connect. Never retried automatically.
    pub async fn connect(&self, address: PeripheralAddress) -> Result<bool, PrinterError> {
        self.request(|reply| PrinterCommand::Connect { address, reply })
            .await
            .map(|()| true)
    }

    /// Bring the link up to the last known printer without writing to it.
    /// `Ok(false)` when there is nothing to connect to or the reopen failed.
    pub async fn ensure_connected(&self) -> Result<bool, PrinterError> {
        self.request(|reply| PrinterCommand::EnsureConnected { reply })
            .await
    }

    pub async fn disconnect(&self) -> Result<(), PrinterError> {
        self.request(|reply| PrinterCommand::Disconnect { reply })
            .await
    }

    /// Disconnect and drop the remembered printer.
    pub async fn forget(&self) -> Result<(), PrinterError> {
        self.request(|reply| PrinterCommand::Forget { reply }).await
    }

    pub fn is_connected(&self) -> bool {
        self.events.borrow().is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.events.borrow().state
    }

    pub async fn last_known_address(&self) -> Result<Option<PeripheralAddress>, PrinterError> {
        self.request(|reply| PrinterCommand::LastKnownAddress { reply })
            .await
    }

    pub async fn send_bytes(&self, bytes: Vec<u8>) -> Result<(), PrinterError> {
        self.request(|reply| PrinterCommand::SendBytes { bytes, reply })
            .await
    }

    /// Kick the drawer with the configured pin and pulse timings.
    pub async fn open_cash_drawer(&self) -> Result<(), PrinterError> {
        self.request(|reply| PrinterCommand::OpenCashDrawer { kick: None, reply })
            .await
    }

    pub async fn open_cash_drawer_with(&self, kick: DrawerKick) -> Result<(), PrinterError> {
        self.request(|reply| PrinterCommand::OpenCashDrawer {
            kick: Some(kick),
            reply,
        })
        .await
    }

    /// `true`/`false` each time the link enters or leaves Connected.
    /// Only transitions after the call are observed.
    pub fn connection_status(&self) -> impl Stream<Item = bool> + Send + Unpin + 'static {
        BroadcastStream::new(self.status_tx.subscribe()).filter_map(|event| event.ok())
    }

    /// Full state snapshots, starting with the current one.
    pub fn subscribe_events(&self) -> watch::Receiver<ConnectionEvent> {
        self.events.clone()
    }

    /// Stop the actor. The link is closed before it exits.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, PrinterError>>) -> PrinterCommand,
    ) -> Result<T, PrinterError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| PrinterError::ChannelClosed)?;
        rx.await.map_err(|_| PrinterError::ChannelClosed)?
    }
}
