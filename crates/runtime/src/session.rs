//! Session: the context every step, hook and worker reads from.
//!
//! A [`Session`] owns the background workers and hands out its
//! [`SessionContext`] by reference. Host integrations report scene changes
//! through the context's host API; each call dispatches the matching
//! [`HostEvent`] through the hook registry before returning.

use std::ops::Deref;
use std::sync::Arc;

use skirmish_core::trigger::updates_for;
use skirmish_core::{
    ActivationId, ActorId, EffectId, EffectState, MacroEvaluator, MessageId, Position,
    RecordRef, RulesConfig, TemplateId, TokenId, TriggerMatrix, User, UserId,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::activation::{
    ActivationRecord, ActivationRequest, ActivationRunner, InputResponse,
};
use crate::aura::{AuraOutcome, AuraReconciler};
use crate::cards::DamageCard;
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::events::{EventBus, TriggerEvent};
use crate::hooks::{HookRegistry, HostEvent, HostHook, TurnTracker};
use crate::repository::{DocumentStore, RepositoryError, SpatialIndex};
use crate::steps::{Dice, SeededDice, StepHandle, StepRegistry};
use crate::workers::{RelayHandle, RelayWorker, RemovalQueue, RemovalWorker};

/// Macro capability a host may plug in.
pub type SharedMacroEvaluator = Arc<dyn MacroEvaluator<StepHandle> + Send + Sync>;

/// Collaborators and session-scoped state.
pub struct SessionContext {
    config: RuntimeConfig,
    store: Arc<dyn DocumentStore>,
    spatial: Arc<dyn SpatialIndex>,
    dice: Arc<dyn Dice>,
    bus: EventBus,
    matrix: TriggerMatrix,
    steps: StepRegistry,
    hooks: HookRegistry,
    macros: Option<SharedMacroEvaluator>,
    relay: RelayHandle,
    removal: RemovalQueue,
    turns: TurnTracker,
    auras: AuraReconciler,
    gamemaster: User,
}

impl SessionContext {
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.config.rules
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn spatial(&self) -> &dyn SpatialIndex {
        self.spatial.as_ref()
    }

    pub fn dice(&self) -> &dyn Dice {
        self.dice.as_ref()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn matrix(&self) -> &TriggerMatrix {
        &self.matrix
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn macros(&self) -> Option<&(dyn MacroEvaluator<StepHandle> + Send + Sync)> {
        self.macros.as_deref()
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    pub fn removal(&self) -> &RemovalQueue {
        &self.removal
    }

    pub fn turns(&self) -> &TurnTracker {
        &self.turns
    }

    pub fn auras(&self) -> &AuraReconciler {
        &self.auras
    }

    /// The privileged user relayed work runs as.
    pub fn gamemaster(&self) -> User {
        self.gamemaster
    }

    /// Whether any condition on `effect` fires on `event`.
    pub fn listens(&self, effect: &EffectState, event: &str) -> bool {
        updates_for(&effect.flags.conditions, &self.matrix, event)
            .next()
            .is_some()
    }

    /// Runs `event` and its follow-ups through the hook registry.
    pub async fn dispatch(&self, event: HostEvent) -> Result<()> {
        self.hooks.dispatch(self, event).await
    }

    /// Fires `event` for every effect on `actor` that listens to it.
    pub async fn fire_condition(
        &self,
        actor: ActorId,
        event: &str,
        activation: Option<ActivationId>,
    ) -> Result<()> {
        let listeners: Vec<EffectState> = self
            .store
            .effects_on(actor)?
            .into_iter()
            .filter(|effect| effect.is_enabled() && self.listens(effect, event))
            .collect();

        for effect in listeners {
            debug!(target: "runtime::hooks", actor = %actor, effect = %effect.id, event, "condition event fired");
            self.bus.publish(TriggerEvent {
                event: event.to_string(),
                actor,
                effect: Some(effect.id),
                activation,
            });
            self.dispatch(HostEvent::ConditionFired {
                listener: effect.id,
                bearer: effect.id,
                event: event.to_string(),
            })
            .await?;
        }
        Ok(())
    }

    // ===== activations =====

    pub fn runner(&self) -> ActivationRunner<'_> {
        ActivationRunner::new(self)
    }

    /// Creates an activation and runs it until it completes, suspends or ends.
    pub async fn activate(&self, request: ActivationRequest) -> Result<ActivationRecord> {
        let runner = self.runner();
        let record = runner.create(request).await?;
        runner.run(record.id).await
    }

    pub async fn resume(&self, activation: ActivationId, response: InputResponse) -> Result<ActivationRecord> {
        self.runner().resume(activation, response).await
    }

    pub async fn cancel(&self, activation: ActivationId, reason: impl Into<String>) -> Result<ActivationRecord> {
        self.runner().cancel(activation, reason).await
    }

    // ===== damage cards =====

    pub async fn make_damage_card(
        &self,
        user: User,
        source: Option<ActorId>,
        target: ActorId,
        amount: i32,
    ) -> Result<Option<MessageId>> {
        DamageCard::make_for_actor(self, user, source, target, amount).await
    }

    pub fn apply_damage_card(&self, user: User, card: MessageId) -> Result<bool> {
        DamageCard::apply(self, user, card)
    }

    pub fn undo_damage_card(&self, user: User, card: MessageId) -> Result<bool> {
        DamageCard::undo(self, user, card)
    }

    // ===== scene changes =====

    pub async fn move_token(&self, user: UserId, token: TokenId, to: Position) -> Result<()> {
        let Some(mut state) = self.store.token(token)? else {
            return Err(RepositoryError::missing(RecordRef::Token(token)).into());
        };
        let from = state.position;
        if from == to {
            return Ok(());
        }
        state.position = to;
        self.store.save_token(&state)?;
        self.dispatch(HostEvent::TokenMoved {
            token,
            user,
            from,
            to,
        })
        .await
    }

    pub async fn delete_token(&self, token: TokenId) -> Result<()> {
        match self.store.delete_token(token)? {
            Some(token) => self.dispatch(HostEvent::TokenDeleted { token }).await,
            None => Ok(()),
        }
    }

    pub async fn toggle_effect(&self, effect: EffectId, disabled: bool) -> Result<()> {
        let Some(mut state) = self.store.effect(effect)? else {
            return Err(RepositoryError::missing(RecordRef::Effect(effect)).into());
        };
        if state.disabled == disabled {
            return Ok(());
        }
        state.disabled = disabled;
        self.store.save_effect(&state)?;
        self.dispatch(HostEvent::EffectToggled { effect }).await
    }

    pub async fn delete_effect(&self, effect: EffectId) -> Result<()> {
        match self.store.delete_effect(effect)? {
            Some(effect) => self.dispatch(HostEvent::EffectDeleted { effect }).await,
            None => Ok(()),
        }
    }

    pub async fn delete_template(&self, template: TemplateId) -> Result<()> {
        match self.store.delete_template(template)? {
            Some(template) => self.dispatch(HostEvent::TemplateDeleted { template }).await,
            None => Ok(()),
        }
    }

    pub async fn delete_message(&self, message: MessageId) -> Result<()> {
        match self.store.delete_message(message)? {
            Some(message) => self.dispatch(HostEvent::MessageDeleted { message }).await,
            None => Ok(()),
        }
    }

    pub async fn change_turn(
        &self,
        round: u32,
        turn: u32,
        previous: Option<ActorId>,
        current: ActorId,
    ) -> Result<()> {
        self.dispatch(HostEvent::TurnChanged {
            round,
            turn,
            previous,
            current,
        })
        .await
    }

    /// Runs one aura pass outside of any scene change.
    pub async fn reconcile_auras(&self) -> Result<AuraOutcome> {
        self.auras.reconcile(self).await
    }
}

/// A running session: its context plus the workers serving it.
///
/// Dereferences to [`SessionContext`].
pub struct Session {
    context: Arc<SessionContext>,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn context(&self) -> Arc<SessionContext> {
        Arc::clone(&self.context)
    }

    /// Stops the workers, flushing the removal queue first.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        for worker in self.workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }
        info!(target: "runtime::session", "session shut down");
        Ok(())
    }
}

impl Deref for Session {
    type Target = SessionContext;

    fn deref(&self) -> &SessionContext {
        &self.context
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn DocumentStore>>,
    spatial: Option<Arc<dyn SpatialIndex>>,
    dice: Option<Arc<dyn Dice>>,
    gamemaster: User,
    macros: Option<SharedMacroEvaluator>,
    steps: StepRegistry,
    hooks: HookRegistry,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            store: None,
            spatial: None,
            dice: None,
            gamemaster: User::gamemaster(UserId(0)),
            macros: None,
            steps: StepRegistry::standard(),
            hooks: HookRegistry::default_hooks(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses one collaborator as both document store and spatial index.
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: DocumentStore + SpatialIndex + 'static,
    {
        let spatial: Arc<dyn SpatialIndex> = store.clone();
        let documents: Arc<dyn DocumentStore> = store;
        self.spatial = Some(spatial);
        self.store = Some(documents);
        self
    }

    /// Overrides the spatial index set by [`Self::store`].
    pub fn spatial(mut self, spatial: Arc<dyn SpatialIndex>) -> Self {
        self.spatial = Some(spatial);
        self
    }

    /// Dice source; defaults to entropy-seeded dice.
    pub fn dice(mut self, dice: Arc<dyn Dice>) -> Self {
        self.dice = Some(dice);
        self
    }

    pub fn gamemaster(mut self, user: User) -> Self {
        self.gamemaster = user;
        self
    }

    pub fn macros(mut self, evaluator: SharedMacroEvaluator) -> Self {
        self.macros = Some(evaluator);
        self
    }

    /// Registers a session-wide step; a later registration of the same name wins.
    pub fn step(mut self, name: impl Into<String>, executor: StepHandle, run_as_privileged: bool) -> Self {
        self.steps.register(name, executor, run_as_privileged);
        self
    }

    /// Adds a hook to the standard set, replacing one of the same name.
    pub fn hook(mut self, hook: Arc<dyn HostHook>) -> Self {
        self.hooks = self.hooks.with(hook);
        self
    }

    /// Replaces the whole hook set.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build the session and spawn its workers.
    pub async fn build(self) -> Result<Session> {
        let store = self.store.ok_or(RuntimeError::MissingStore)?;
        let spatial = self.spatial.ok_or(RuntimeError::MissingStore)?;
        let dice = self
            .dice
            .unwrap_or_else(|| Arc::new(SeededDice::from_entropy()));

        let (relay_tx, relay_rx) = mpsc::channel(self.config.relay_buffer_size);
        let (removal_tx, removal_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let bus = EventBus::with_capacity(self.config.event_buffer_size);
        let debounce = self.config.removal_debounce;
        let context = Arc::new(SessionContext {
            config: self.config,
            store: Arc::clone(&store),
            spatial,
            dice,
            bus,
            matrix: TriggerMatrix::STANDARD,
            steps: self.steps,
            hooks: self.hooks,
            macros: self.macros,
            relay: RelayHandle::new(relay_tx),
            removal: RemovalQueue::new(removal_tx),
            turns: TurnTracker::new(),
            auras: AuraReconciler::new(),
            gamemaster: self.gamemaster,
        });

        let relay_worker = RelayWorker::new(Arc::downgrade(&context), relay_rx, shutdown_rx.clone());
        let removal_worker = RemovalWorker::new(store, removal_rx, shutdown_rx, debounce);
        let workers = vec![
            tokio::spawn(async move {
                relay_worker.run().await;
            }),
            tokio::spawn(async move {
                removal_worker.run().await;
            }),
        ];

        info!(
            target: "runtime::session",
            steps = context.steps().names().count(),
            hooks = context.hooks().len(),
            "session started"
        );
        Ok(Session {
            context,
            shutdown_tx,
            workers,
        })
    }
}
