//! Activation runner: builds a plan, then executes it step by step.
//!
//! The record is persisted after every step. A step that needs user input
//! suspends the activation; [`ActivationRunner::resume`] hands the answer to
//! that same step and carries on. Steps registered as privileged run through
//! the relay when the acting user lacks privilege.

use chrono::Utc;
use skirmish_core::{
    ActivationId, ActorId, ApplicationType, BuiltPlan, DefaultFlow, EffectId, ItemId, ItemTraits,
    MacroEvaluator, User, build_plan,
};
use skirmish_core::trigger::events;
use tracing::{debug, error, info, warn};

use super::{ActivationRecord, ActivationState, InputResponse, Target};
use crate::cards::ActivationCard;
use crate::error::{Result, RuntimeError, StepError};
use crate::events::ActivationEvent;
use crate::hooks::HostEvent;
use crate::session::SessionContext;
use crate::steps::{StepContext, StepHandle, StepOutcome, StepTable};

/// What to activate, for whom, and in which phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRequest {
    pub actor: ActorId,
    pub item: ItemId,
    pub user: User,
    pub application: ApplicationType,
    pub flow: DefaultFlow,
    /// Effect whose condition started the activation.
    pub source_effect: Option<EffectId>,
    /// Targets known up front; targeting steps may replace them.
    pub targets: Vec<Target>,
}

impl ActivationRequest {
    /// Standard item roll in the immediate phase.
    pub fn new(actor: ActorId, item: ItemId, user: User) -> Self {
        Self {
            actor,
            item,
            user,
            application: ApplicationType::Immediate,
            flow: DefaultFlow::ItemRoll,
            source_effect: None,
            targets: Vec::new(),
        }
    }

    pub fn with_flow(mut self, flow: DefaultFlow, application: ApplicationType) -> Self {
        self.flow = flow;
        self.application = application;
        self
    }

    pub fn with_source_effect(mut self, effect: EffectId) -> Self {
        self.source_effect = Some(effect);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }
}

/// Drives activations against a session.
pub struct ActivationRunner<'a> {
    ctx: &'a SessionContext,
}

impl<'a> ActivationRunner<'a> {
    pub fn new(ctx: &'a SessionContext) -> Self {
        Self { ctx }
    }

    fn build(&self, item: &ItemTraits, application: ApplicationType, flow: DefaultFlow) -> Result<BuiltPlan<StepHandle>> {
        let macros = self
            .ctx
            .macros()
            .map(|evaluator| evaluator as &dyn MacroEvaluator<StepHandle>);
        Ok(build_plan(item, application, &flow, macros, self.ctx.rules())?)
    }

    /// Builds the plan, persists a pending record and publishes its cards.
    pub async fn create(&self, request: ActivationRequest) -> Result<ActivationRecord> {
        let store = self.ctx.store();
        let item = store.require_item(request.item)?;
        let built = self.build(&item, request.application, request.flow)?;

        let mut record = ActivationRecord {
            id: store.next_activation_id()?,
            actor: request.actor,
            item: item.id,
            user: request.user,
            application: request.application,
            flow: request.flow,
            source_effect: request.source_effect,
            fingerprint: built.plan.fingerprint(),
            plan: built.plan,
            pre_roll: built.pre_roll,
            targets: request.targets,
            cursor: 0,
            state: ActivationState::Pending,
            outputs: Default::default(),
            pending_input: None,
            messages: Default::default(),
            template: None,
            master_effect: None,
            error: None,
            created_at: Utc::now(),
            archived_at: None,
        };
        store.save_activation(&record)?;

        let (links, master) = ActivationCard::publish(self.ctx, &record)?;
        record.messages = links;
        store.save_activation(&record)?;

        info!(
            target: "runtime::activation",
            activation = %record.id,
            item = %item.name,
            source = ?built.source,
            steps = record.plan.len(),
            "activation created"
        );
        self.ctx.bus().publish(ActivationEvent::Created {
            activation: record.id,
            steps: record.plan.len(),
        });

        self.ctx
            .dispatch(HostEvent::MessageCreated { message: master })
            .await?;
        if record.source_effect.is_none() {
            self.ctx
                .fire_condition(record.actor, events::TAKE_AN_ACTION, Some(record.id))
                .await?;
        }

        Ok(store.require_activation(record.id)?)
    }

    /// Runs the activation until it completes, suspends or ends.
    pub async fn run(&self, id: ActivationId) -> Result<ActivationRecord> {
        self.drive(id, None).await
    }

    /// Answers the prompt a suspended activation is waiting on and continues.
    pub async fn resume(&self, id: ActivationId, response: InputResponse) -> Result<ActivationRecord> {
        let record = self.ctx.store().require_activation(id)?;
        if record.state != ActivationState::AwaitingInput {
            return Err(RuntimeError::InvalidState {
                activation: id,
                state: record.state,
                expected: ActivationState::AwaitingInput,
            });
        }
        self.drive(id, Some(response)).await
    }

    /// Ends a live activation without completing its plan.
    pub async fn cancel(&self, id: ActivationId, reason: impl Into<String>) -> Result<ActivationRecord> {
        let mut record = self.ctx.store().require_activation(id)?;
        if record.is_terminal() {
            return Ok(record);
        }
        record.error = Some(reason.into());
        record.archive(ActivationState::Cancelled);
        self.persist(&record)?;
        self.publish_abort(&record);
        Ok(record)
    }

    async fn drive(&self, id: ActivationId, mut input: Option<InputResponse>) -> Result<ActivationRecord> {
        let store = self.ctx.store();
        let mut record = store.require_activation(id)?;
        if record.is_terminal() {
            return Ok(record);
        }

        let Some(item) = store.item(record.item)? else {
            let reason = format!("{} no longer exists", record.item);
            self.fail(&mut record, reason)?;
            return Ok(record);
        };
        let table = self.table_for(&record, &item)?;

        record.state = ActivationState::Running;
        record.pending_input = None;
        self.persist(&record)?;

        while record.state == ActivationState::Running && record.cursor < record.plan.len() {
            let index = record.cursor;
            let Some(entry) = record.plan.get(index).and_then(|step| table.get(&step.name)) else {
                let name = record.plan.get(index).map(|step| step.name.to_string()).unwrap_or_default();
                self.fail(&mut record, RuntimeError::UnknownStep(name).to_string())?;
                break;
            };

            if entry.run_as_privileged && !record.user.is_privileged() {
                debug!(
                    target: "runtime::activation",
                    activation = %id,
                    index,
                    "relaying privileged step"
                );
                self.ctx.relay().execute_step(id, index, input.take()).await?;
                record = store.require_activation(id)?;
                if record.state == ActivationState::Running && record.cursor == index {
                    self.fail(&mut record, format!("relayed step {index} made no progress"))?;
                    break;
                }
                continue;
            }

            let executor = entry.executor.clone();
            let user = record.user;
            self.execute(&mut record, &item, executor, user, input.take()).await?;
        }

        if record.state == ActivationState::Running {
            record.archive(ActivationState::Completed);
            self.persist(&record)?;
            info!(target: "runtime::activation", activation = %id, "activation completed");
            self.ctx
                .bus()
                .publish(ActivationEvent::Completed { activation: id });
        }
        Ok(record)
    }

    /// Plan executors for `record`: session steps plus whatever the flow
    /// registers when evaluated again.
    fn table_for(&self, record: &ActivationRecord, item: &ItemTraits) -> Result<StepTable> {
        let built = self.build(item, record.application, record.flow)?;
        if built.plan.fingerprint() != record.fingerprint {
            warn!(
                target: "runtime::activation",
                activation = %record.id,
                "item changed since the plan was built; continuing with the stored plan"
            );
        }
        Ok(self.ctx.steps().resolve(built.custom_steps))
    }

    /// Executes the step at the cursor as `user` and records the outcome.
    async fn execute(
        &self,
        record: &mut ActivationRecord,
        item: &ItemTraits,
        executor: StepHandle,
        user: User,
        input: Option<InputResponse>,
    ) -> Result<()> {
        let index = record.cursor;
        let Some(step) = record.plan.get(index).cloned() else {
            return Ok(());
        };
        let cx = StepContext {
            session: self.ctx,
            user,
            item,
            step: &step,
            index,
            input,
        };
        let outcome = executor.execute(cx, record).await;
        self.settle(record, &step.name.to_string(), outcome)
    }

    /// Executes the step at `index` as the privileged user. Called by the relay.
    pub(crate) async fn execute_relayed(
        &self,
        id: ActivationId,
        index: usize,
        input: Option<InputResponse>,
    ) -> Result<()> {
        let store = self.ctx.store();
        let mut record = store.require_activation(id)?;
        if record.is_terminal() || record.cursor != index {
            warn!(
                target: "runtime::relay",
                activation = %id,
                index,
                cursor = record.cursor,
                "stale relay request ignored"
            );
            return Ok(());
        }
        let item = store.require_item(record.item)?;
        let table = self.table_for(&record, &item)?;
        let Some(executor) = record
            .plan
            .get(index)
            .and_then(|step| table.get(&step.name))
            .map(|entry| entry.executor.clone())
        else {
            let name = record.plan.get(index).map(|step| step.name.to_string()).unwrap_or_default();
            return self.fail(&mut record, RuntimeError::UnknownStep(name).to_string());
        };
        self.execute(&mut record, &item, executor, self.ctx.gamemaster(), input)
            .await
    }

    fn settle(
        &self,
        record: &mut ActivationRecord,
        step: &str,
        outcome: std::result::Result<StepOutcome, StepError>,
    ) -> Result<()> {
        let index = record.cursor;
        match outcome {
            Ok(StepOutcome::Completed(output)) => {
                if let Some(output) = output {
                    record.outputs.insert(index, output);
                }
                record.cursor += 1;
                self.persist(record)?;
                debug!(target: "runtime::activation", activation = %record.id, index, step, "step completed");
                self.ctx.bus().publish(ActivationEvent::StepCompleted {
                    activation: record.id,
                    index,
                    step: step.into(),
                });
            }
            Ok(StepOutcome::Suspend(request)) => {
                record.state = ActivationState::AwaitingInput;
                record.pending_input = Some(request.clone());
                self.persist(record)?;
                self.ctx.bus().publish(ActivationEvent::AwaitingInput {
                    activation: record.id,
                    request,
                });
            }
            Ok(StepOutcome::Cancel(reason)) => {
                info!(target: "runtime::activation", activation = %record.id, step, reason = %reason, "activation cancelled");
                record.error = Some(reason);
                record.archive(ActivationState::Cancelled);
                self.persist(record)?;
                self.publish_abort(record);
            }
            Err(step_error) => {
                let error = RuntimeError::Step {
                    step: step.to_string(),
                    source: step_error,
                };
                self.fail(record, error_chain(&error))?;
            }
        }
        Ok(())
    }

    fn fail(&self, record: &mut ActivationRecord, reason: String) -> Result<()> {
        error!(target: "runtime::activation", activation = %record.id, error = %reason, "activation failed");
        record.error = Some(reason);
        record.archive(ActivationState::Failed);
        self.persist(record)?;
        self.publish_abort(record);
        Ok(())
    }

    fn persist(&self, record: &ActivationRecord) -> Result<()> {
        self.ctx.store().save_activation(record)?;
        ActivationCard::refresh(self.ctx, record)
    }

    fn publish_abort(&self, record: &ActivationRecord) {
        self.ctx.bus().publish(ActivationEvent::Aborted {
            activation: record.id,
            state: record.state,
            reason: record.error.clone(),
        });
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
