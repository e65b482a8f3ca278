//! Debounced removal of linked message views.
//!
//! Deleting any view of an activation card enqueues the other views. The
//! worker waits for a quiet period, collapses duplicate identifiers, then
//! clears each message's links before deleting it so the deletions do not
//! cascade back into the queue. A master view removed this way takes its
//! activation down with it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use skirmish_core::MessageId;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::{Result, RuntimeError};
use crate::hooks::tear_down_activation;
use crate::repository::{DocumentStore, MessageLinks};

/// Sender side of the removal queue.
#[derive(Clone)]
pub struct RemovalQueue {
    tx: mpsc::UnboundedSender<MessageId>,
}

impl RemovalQueue {
    pub fn new(tx: mpsc::UnboundedSender<MessageId>) -> Self {
        Self { tx }
    }

    pub fn enqueue(&self, ids: impl IntoIterator<Item = MessageId>) -> Result<()> {
        for id in ids {
            self.tx
                .send(id)
                .map_err(|_| RuntimeError::RemovalChannelClosed)?;
        }
        Ok(())
    }
}

/// Background task draining the removal queue in debounced batches.
pub struct RemovalWorker {
    store: Arc<dyn DocumentStore>,
    rx: mpsc::UnboundedReceiver<MessageId>,
    shutdown_rx: watch::Receiver<bool>,
    debounce: Duration,
    pending: BTreeSet<MessageId>,
}

impl RemovalWorker {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        rx: mpsc::UnboundedReceiver<MessageId>,
        shutdown_rx: watch::Receiver<bool>,
        debounce: Duration,
    ) -> Self {
        Self {
            store,
            rx,
            shutdown_rx,
            debounce,
            pending: BTreeSet::new(),
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(id) = self.rx.recv() => {
                    self.pending.insert(id);
                    self.collect_until_quiet().await;
                    self.flush();
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                else => break,
            }
        }

        while let Ok(id) = self.rx.try_recv() {
            self.pending.insert(id);
        }
        self.flush();
        debug!(target: "runtime::mirror", "removal worker stopped");
    }

    /// Keeps collecting identifiers until none arrives for a full debounce window.
    async fn collect_until_quiet(&mut self) {
        loop {
            match tokio::time::timeout(self.debounce, self.rx.recv()).await {
                Ok(Some(id)) => {
                    self.pending.insert(id);
                }
                Ok(None) | Err(_) => break,
            }
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);
        debug!(target: "runtime::mirror", count = batch.len(), "removing linked messages");

        for id in batch {
            if let Err(error) = self.remove(id) {
                warn!(target: "runtime::mirror", message = %id, error = %error, "linked message removal skipped");
            }
        }
    }

    fn remove(&self, id: MessageId) -> Result<()> {
        let Some(mut message) = self.store.message(id)? else {
            return Ok(());
        };
        let master = message.flags.links.master == Some(id);
        message.flags.links = MessageLinks::default();
        self.store.save_message(&message)?;
        self.store.delete_message(id)?;

        if master && let Some(activation) = message.flags.activation {
            tear_down_activation(self.store.as_ref(), activation)?;
        }
        Ok(())
    }
}
