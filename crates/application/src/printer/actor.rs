use domain::{DrawerKick, PeripheralAddress, PrinterError};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::dispatcher::CommandDispatcher;

type Reply<T> = oneshot::Sender<Result<T, PrinterError>>;

/// Requests accepted by the printer actor, processed strictly in arrival order
#[derive(Debug)]
pub(crate) enum PrinterCommand {
    Connect {
        address: PeripheralAddress,
        reply: Reply<()>,
    },
    EnsureConnected {
        reply: Reply<bool>,
    },
    Disconnect {
        reply: Reply<()>,
    },
    Forget {
        reply: Reply<()>,
    },
    SendBytes {
        bytes: Vec<u8>,
        reply: Reply<()>,
    },
    OpenCashDrawer {
        kick: Option<DrawerKick>,
        reply: Reply<()>,
    },
    LastKnownAddress {
        reply: Reply<Option<PeripheralAddress>>,
    },
}

/// Single owner of the dispatcher and therefore of the link
pub(crate) struct PrinterActor {
    dispatcher: CommandDispatcher,
    rx: mpsc::Receiver<PrinterCommand>,
    cancel_token: CancellationToken,
}

impl PrinterActor {
    pub(crate) fn new(
        dispatcher: CommandDispatcher,
        rx: mpsc::Receiver<PrinterCommand>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            dispatcher,
            rx,
            cancel_token,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("🖨️ Printer actor started");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
                command = self.rx.recv() => match command {
                    // Runs to completion: a started write is never cancelled
                    Some(command) => self.handle(command).await,
                    None => {
                        info!("🖨️ All printer handles dropped. Printer actor shutting down.");
                        break;
                    }
                }
            }
        }

        self.dispatcher.shutdown().await;
        info!("🖨️ Printer actor stopped");
    }

    async fn handle(&mut self, command: PrinterCommand) {
        match command {
            PrinterCommand::Connect { address, reply } => {
                let result = self.dispatcher.manager_mut().connect(address).await;
                respond(reply, result);
            }
            PrinterCommand::EnsureConnected { reply } => {
                let connected = self.dispatcher.manager_mut().ensure_connected().await;
                respond(reply, Ok(connected));
            }
            PrinterCommand::Disconnect { reply } => {
                self.dispatcher.manager_mut().disconnect().await;
                respond(reply, Ok(()));
            }
            PrinterCommand::Forget { reply } => {
                self.dispatcher.manager_mut().forget().await;
                respond(reply, Ok(()));
            }
            PrinterCommand::SendBytes { bytes, reply } => {
                let result = self.dispatcher.send_bytes(&bytes).await;
                respond(reply, result);
            }
            PrinterCommand::OpenCashDrawer { kick, reply } => {
                let result = self.dispatcher.open_cash_drawer(kick).await;
                respond(reply, result);
            }
            PrinterCommand::LastKnownAddress { reply } => {
                let address = self.dispatcher.manager().last_known().cloned();
                respond(reply, Ok(address));
            }
        }
    }
}

fn respond<T>(reply: Reply<T>, result: Result<T, PrinterError>) {
    if reply.send(result).is_err() {
        debug!("Caller went away before the printer replied");
    }
}
