//! Web domain event sink implementation.

use std::sync::Mutex;

use ledgerfolio_core::events::{DomainEvent, DomainEventSink};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain event sink for the web server runtime.
///
/// `emit` only pushes onto a channel. Events are buffered until
/// [`WebDomainEventSink::start_worker`] spawns the consumer.
pub struct WebDomainEventSink {
    tx: mpsc::UnboundedSender<DomainEvent>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<DomainEvent>>>,
}

impl Default for WebDomainEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WebDomainEventSink {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Spawns the worker. Calling it again is a no-op.
    pub fn start_worker(&self) {
        let receiver = match self.rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(mut rx) = receiver else {
            warn!("Domain event worker already started");
            return;
        };

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                log_event(&event);
            }
        });
    }
}

fn log_event(event: &DomainEvent) {
    match event {
        DomainEvent::TransactionRecorded {
            user_id,
            transaction_id,
            symbols,
        } => info!(
            user_id = %user_id,
            transaction_id = %transaction_id,
            symbols = ?symbols,
            "transaction recorded"
        ),
        DomainEvent::SnapshotCreated {
            user_id,
            snapshot_id,
            source,
            timestamp,
        } => info!(
            user_id = %user_id,
            snapshot_id = %snapshot_id,
            source = %source,
            timestamp = %timestamp,
            "snapshot created"
        ),
        DomainEvent::PriceFallbackUsed {
            user_id,
            snapshot_id,
            symbols,
        } => warn!(
            user_id = %user_id,
            snapshot_id = %snapshot_id,
            symbols = ?symbols,
            "snapshot valued assets at cost basis"
        ),
    }
}

impl DomainEventSink for WebDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        // Receiver only disappears on shutdown
        let _ = self.tx.send(event);
    }
}
