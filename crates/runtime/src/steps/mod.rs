//! Step executors: the code behind every step name a plan can contain.
//!
//! Each executor receives the activation record mutably and returns a
//! [`StepOutcome`]. The runner persists the record after every step, so an
//! executor only has to leave its results in the record (or in the returned
//! [`StepOutput`]) for later steps to read.

mod damage;
mod dice;
mod effects;
mod rolls;
mod targeting;
mod trigger;

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use skirmish_core::{BuiltinStep, CustomStep, ItemTraits, Step, StepName, User};
use strum::IntoEnumIterator;

pub use dice::{Dice, ScriptedDice, SeededDice, roll_d20, roll_parts};

use crate::activation::{ActivationRecord, InputRequest, InputResponse, RollMode, StepOutput};
use crate::error::StepError;
use crate::session::SessionContext;

/// Shared handle to a step executor.
pub type StepHandle = Arc<dyn StepExecutor>;

/// Result of executing one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step finished; the cursor advances.
    Completed(Option<StepOutput>),
    /// The step needs input from the acting user before it can finish.
    Suspend(InputRequest),
    /// The activation ends here without completing its plan.
    Cancel(String),
}

impl StepOutcome {
    pub fn done() -> Self {
        StepOutcome::Completed(None)
    }

    pub fn output(output: StepOutput) -> Self {
        StepOutcome::Completed(Some(output))
    }
}

/// Everything a step may consult besides the record itself.
pub struct StepContext<'a> {
    pub session: &'a SessionContext,
    /// Effective user: the acting user, or the privileged user when relayed.
    pub user: User,
    pub item: &'a ItemTraits,
    pub step: &'a Step,
    pub index: usize,
    /// Answer to the prompt this step suspended on, when resuming.
    pub input: Option<InputResponse>,
}

impl StepContext<'_> {
    /// Resolves the advantage state for a roll, prompting unless the flow
    /// asked to skip the configuration dialog.
    pub fn roll_mode(&self, record: &ActivationRecord) -> Result<ControlFlow<StepOutcome, RollMode>, StepError> {
        match &self.input {
            None if record.pre_roll.skip_configuration_dialog => Ok(ControlFlow::Continue(RollMode::Normal)),
            None => Ok(ControlFlow::Break(StepOutcome::Suspend(InputRequest::ConfigureRoll {
                step: self.step.name.clone(),
                variants: record.pre_roll.variant_options.clone(),
                custom: record.pre_roll.custom_configuration.clone(),
            }))),
            Some(InputResponse::Roll { mode, .. }) => Ok(ControlFlow::Continue(*mode)),
            Some(InputResponse::Decline) => Ok(ControlFlow::Break(StepOutcome::Cancel(
                "roll configuration dismissed".into(),
            ))),
            Some(_) => Err(self.unexpected_input()),
        }
    }

    pub fn unexpected_input(&self) -> StepError {
        StepError::UnexpectedInput {
            step: self.step.name.to_string(),
        }
    }
}

/// Executes one named step of a plan.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError>;
}

/// Step names the session knows before any flow registers its own.
#[derive(Clone)]
pub struct StepRegistry {
    steps: BTreeMap<String, CustomStep<StepHandle>>,
}

impl StepRegistry {
    /// Registry without any step.
    pub fn empty() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Registry with an executor for every built-in step.
    ///
    /// Effect creation and removal mutate actors the acting user may not own,
    /// so those steps run through the privileged relay.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for step in BuiltinStep::iter() {
            let privileged = matches!(
                step,
                BuiltinStep::ApplyEffects | BuiltinStep::EndEffect | BuiltinStep::EndEffectOnSave
            );
            registry.register(step.to_string(), builtin(step), privileged);
        }
        registry
    }

    /// Installs (or replaces) a session-wide step.
    pub fn register(&mut self, name: impl Into<String>, executor: StepHandle, run_as_privileged: bool) {
        self.steps.insert(
            name.into(),
            CustomStep {
                run_as_privileged,
                executor,
            },
        );
    }

    /// Overlays the steps a flow registered during evaluation; flow steps
    /// shadow session steps of the same name.
    pub fn resolve(&self, flow_steps: BTreeMap<String, CustomStep<StepHandle>>) -> StepTable {
        let mut steps = self.steps.clone();
        steps.extend(flow_steps);
        StepTable { steps }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Executors available to one activation.
pub struct StepTable {
    steps: BTreeMap<String, CustomStep<StepHandle>>,
}

impl StepTable {
    pub fn get(&self, name: &StepName) -> Option<&CustomStep<StepHandle>> {
        self.steps.get(name.as_str())
    }
}

fn builtin(step: BuiltinStep) -> StepHandle {
    match step {
        BuiltinStep::ApplyDefaultTargets => Arc::new(targeting::DefaultTargets),
        BuiltinStep::ApplyDefaultTargetsAsEffective => Arc::new(targeting::EffectiveTargets),
        BuiltinStep::ApplySelectedTargets => Arc::new(targeting::SelectedTargets),
        BuiltinStep::PlaceTemplate => Arc::new(targeting::PlaceTemplate),
        BuiltinStep::ConfirmTargets => Arc::new(targeting::ConfirmTargets),
        BuiltinStep::PerformAttackRoll => Arc::new(rolls::AttackRoll),
        BuiltinStep::PerformAttackDamageRoll => Arc::new(rolls::AttackDamageRoll),
        BuiltinStep::PerformSavingThrow => Arc::new(rolls::SavingThrow),
        BuiltinStep::PerformSaveDamageRoll => Arc::new(rolls::SaveDamageRoll),
        BuiltinStep::ApplyDamage => Arc::new(damage::ApplyDamage),
        BuiltinStep::ApplyConcentration => Arc::new(effects::Concentration),
        BuiltinStep::ApplyDurationEffect => Arc::new(effects::DurationEffect),
        BuiltinStep::ApplyEffects => Arc::new(effects::ApplyEffects),
        BuiltinStep::EndEffect => Arc::new(effects::EndEffect),
        BuiltinStep::EndEffectOnSave => Arc::new(effects::EndEffectOnSave),
        BuiltinStep::TriggerAction => Arc::new(trigger::TriggerAction),
        BuiltinStep::AttackCompleted => Arc::new(trigger::AttackCompleted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl StepExecutor for Noop {
        async fn execute(
            &self,
            _cx: StepContext<'_>,
            _record: &mut ActivationRecord,
        ) -> Result<StepOutcome, StepError> {
            Ok(StepOutcome::done())
        }
    }

    #[test]
    fn standard_registry_covers_every_builtin() {
        let registry = StepRegistry::standard();
        let table = registry.resolve(BTreeMap::new());
        for step in BuiltinStep::iter() {
            assert!(table.get(&StepName::from(step)).is_some(), "{step}");
        }
        assert!(table.get(&StepName::from("applyEffects")).unwrap().run_as_privileged);
        assert!(!table.get(&StepName::from("applyDamage")).unwrap().run_as_privileged);
    }

    #[test]
    fn flow_registrations_shadow_session_steps() {
        let registry = StepRegistry::standard();
        let mut flow_steps = BTreeMap::new();
        flow_steps.insert(
            "applyDamage".to_string(),
            CustomStep {
                run_as_privileged: true,
                executor: Arc::new(Noop) as StepHandle,
            },
        );
        flow_steps.insert(
            "knockProne".to_string(),
            CustomStep {
                run_as_privileged: false,
                executor: Arc::new(Noop) as StepHandle,
            },
        );

        let table = registry.resolve(flow_steps);
        assert!(table.get(&StepName::from("applyDamage")).unwrap().run_as_privileged);
        assert!(table.get(&StepName::from("knockProne")).is_some());
        assert!(table.get(&StepName::from("unknown")).is_none());
    }
}
