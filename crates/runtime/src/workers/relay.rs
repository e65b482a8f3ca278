//! Privileged relay: runs steps and card writes as the session's privileged
//! user on behalf of users who lack the rights.
//!
//! Requests that touch the same key (one activation, or one target actor)
//! run strictly in submission order; unrelated requests run concurrently.

use std::collections::HashMap;
use std::sync::Weak;

use skirmish_core::{ActivationId, ActorId, MessageId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::activation::{ActivationRunner, InputResponse};
use crate::cards::{DamageCard, DamageCardRequest};
use crate::error::{Result, RuntimeError};
use crate::session::SessionContext;

/// Requests the relay accepts.
pub enum RelayRequest {
    /// Execute the step at `index` of an activation as the privileged user.
    ExecuteStep {
        activation: ActivationId,
        index: usize,
        input: Option<InputResponse>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Write a damage card for a target the requester cannot address.
    CreateDamageCard {
        request: DamageCardRequest,
        reply: oneshot::Sender<Result<Option<MessageId>>>,
    },
}

/// Ordering key: requests sharing a key never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RelayKey {
    Activation(ActivationId),
    Actor(ActorId),
}

impl RelayRequest {
    fn key(&self) -> RelayKey {
        match self {
            RelayRequest::ExecuteStep { activation, .. } => RelayKey::Activation(*activation),
            RelayRequest::CreateDamageCard { request, .. } => RelayKey::Actor(request.target),
        }
    }
}

/// Cloneable sender side of the relay.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayRequest>,
}

impl RelayHandle {
    pub fn new(tx: mpsc::Sender<RelayRequest>) -> Self {
        Self { tx }
    }

    pub async fn execute_step(
        &self,
        activation: ActivationId,
        index: usize,
        input: Option<InputResponse>,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RelayRequest::ExecuteStep {
                activation,
                index,
                input,
                reply,
            })
            .await
            .map_err(|_| RuntimeError::RelayChannelClosed)?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    pub async fn create_damage_card(&self, request: DamageCardRequest) -> Result<Option<MessageId>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RelayRequest::CreateDamageCard { request, reply })
            .await
            .map_err(|_| RuntimeError::RelayChannelClosed)?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }
}

/// Background task serving [`RelayRequest`]s.
pub struct RelayWorker {
    context: Weak<SessionContext>,
    request_rx: mpsc::Receiver<RelayRequest>,
    shutdown_rx: watch::Receiver<bool>,
    chains: HashMap<RelayKey, JoinHandle<()>>,
}

impl RelayWorker {
    pub fn new(
        context: Weak<SessionContext>,
        request_rx: mpsc::Receiver<RelayRequest>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            context,
            request_rx,
            shutdown_rx,
            chains: HashMap::new(),
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(request) = self.request_rx.recv() => self.schedule(request),
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                else => break,
            }
        }

        for (_, chain) in self.chains.drain() {
            if let Err(error) = chain.await {
                warn!(target: "runtime::relay", error = %error, "relay task panicked");
            }
        }
        debug!(target: "runtime::relay", "relay worker stopped");
    }

    fn schedule(&mut self, request: RelayRequest) {
        self.chains.retain(|_, chain| !chain.is_finished());

        let key = request.key();
        let previous = self.chains.remove(&key);
        let context = self.context.clone();

        let chain = tokio::spawn(async move {
            if let Some(previous) = previous
                && let Err(error) = previous.await
            {
                warn!(target: "runtime::relay", error = %error, "previous relay task for this key panicked");
            }
            serve(context, request).await;
        });
        self.chains.insert(key, chain);
    }
}

async fn serve(context: Weak<SessionContext>, request: RelayRequest) {
    let Some(context) = context.upgrade() else {
        debug!(target: "runtime::relay", "session dropped, relay request abandoned");
        return;
    };

    match request {
        RelayRequest::ExecuteStep {
            activation,
            index,
            input,
            reply,
        } => {
            let result = ActivationRunner::new(&context)
                .execute_relayed(activation, index, input)
                .await;
            if reply.send(result).is_err() {
                debug!(target: "runtime::relay", "ExecuteStep reply channel closed (caller dropped)");
            }
        }
        RelayRequest::CreateDamageCard { request, reply } => {
            let result = DamageCard::create(&context, context.gamemaster(), request);
            if reply.send(result).is_err() {
                debug!(target: "runtime::relay", "CreateDamageCard reply channel closed (caller dropped)");
            }
        }
    }
}
