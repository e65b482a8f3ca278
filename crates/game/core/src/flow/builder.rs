//! The flow builder: predicates and combinators an evaluator composes into a
//! plan.
//!
//! Every predicate method checks its guard against the item and application
//! phase, then behaves like [`Flow::pick`] over its branches. Every operation
//! method yields a single step. Nothing here performs I/O, so evaluating the
//! same item twice yields the same branch tree.

use std::collections::BTreeMap;

use super::{Branch, BuiltinStep, Step, StepArgs, StepName};
use crate::item::{ApplicationType, ItemTraits, predicates};

/// A step executor a flow installed for itself.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomStep<X> {
    /// Run through the privileged relay when the acting user lacks rights.
    pub run_as_privileged: bool,
    pub executor: X,
}

/// Options a flow sets for the configuration dialog shown before rolling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PreRollOptions {
    /// Host-resolved key of a custom configuration prompt.
    pub custom_configuration: Option<String>,
    pub variant_options: Vec<String>,
    pub skip_configuration_dialog: bool,
}

/// Evaluation context for one `(item, application phase)` pair.
pub struct Flow<'a, X> {
    item: &'a ItemTraits,
    application: ApplicationType,
    custom_steps: BTreeMap<String, CustomStep<X>>,
    pre_roll: PreRollOptions,
}

impl<'a, X> Flow<'a, X> {
    pub fn new(item: &'a ItemTraits, application: ApplicationType) -> Self {
        Self {
            item,
            application,
            custom_steps: BTreeMap::new(),
            pre_roll: PreRollOptions::default(),
        }
    }

    pub fn item(&self) -> &'a ItemTraits {
        self.item
    }

    pub fn application(&self) -> ApplicationType {
        self.application
    }

    pub fn pre_roll_options(&self) -> &PreRollOptions {
        &self.pre_roll
    }

    pub fn custom_steps(&self) -> &BTreeMap<String, CustomStep<X>> {
        &self.custom_steps
    }

    pub(super) fn into_parts(self) -> (BTreeMap<String, CustomStep<X>>, PreRollOptions) {
        (self.custom_steps, self.pre_roll)
    }

    // ===== flow control =====

    /// First present branch; later branches are not inspected.
    pub fn pick(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        branches.into_iter().flatten().next()
    }

    /// Like [`Self::pick`], but each branch is only built if every branch
    /// before it was absent.
    pub fn pick_lazy<F>(&self, branches: impl IntoIterator<Item = F>) -> Option<Branch>
    where
        F: FnOnce() -> Option<Branch>,
    {
        branches.into_iter().find_map(|branch| branch())
    }

    /// Every present branch, in order. Always yields a (possibly empty) list.
    pub fn sequence(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        Some(Branch::Seq(branches.into_iter().flatten().collect()))
    }

    /// [`Self::pick`] followed by one level of flattening.
    pub fn otherwise(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.pick(branches).map(Branch::flatten_once)
    }

    /// Normalizes any branch result into a list.
    pub fn chain(&self, branch: Option<Branch>) -> Branch {
        match branch {
            Some(Branch::Seq(children)) => Branch::Seq(children),
            Some(step) => Branch::Seq(vec![step]),
            None => Branch::empty(),
        }
    }

    /// Installs or replaces the executor for `name`. Last registration wins.
    pub fn register_flow_step(
        &mut self,
        name: impl Into<String>,
        run_as_privileged: bool,
        executor: X,
    ) {
        self.custom_steps.insert(
            name.into(),
            CustomStep {
                run_as_privileged,
                executor,
            },
        );
    }

    pub fn perform_custom_step(
        &self,
        name: impl Into<String>,
        args: impl Into<StepArgs>,
    ) -> Option<Branch> {
        Some(Branch::Step(Step::new(
            StepName::from(name.into()),
            args,
        )))
    }

    // ===== pre-roll options =====

    pub fn request_custom_configuration(&mut self, key: impl Into<String>) {
        self.pre_roll.custom_configuration = Some(key.into());
    }

    pub fn select_variant(&mut self, options: impl IntoIterator<Item = impl Into<String>>) {
        self.pre_roll.variant_options = options.into_iter().map(Into::into).collect();
    }

    pub fn skip_configuration_dialog(&mut self) {
        self.pre_roll.skip_configuration_dialog = true;
    }

    // ===== item predicates =====

    fn guard(
        &self,
        condition: bool,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        if condition { self.pick(branches) } else { None }
    }

    pub fn has_area_target(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::has_area_target(self.item), branches)
    }

    pub fn has_concentration(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::has_concentration(self.item), branches)
    }

    pub fn has_damage(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(
            predicates::has_damage_of_type(self.item, self.application),
            branches,
        )
    }

    pub fn has_damage_or_effects(
        &self,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        let applies = predicates::has_damage_of_type(self.item, self.application)
            || predicates::has_effects_of_type(self.item, self.application);
        self.guard(applies, branches)
    }

    pub fn has_duration(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::has_duration(self.item), branches)
    }

    pub fn has_save(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::has_save(self.item), branches)
    }

    /// A save exists and something of this phase can be saved against.
    pub fn has_saveable_applications(
        &self,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        let applies = predicates::has_save(self.item)
            && predicates::has_saveable_applications_of_type(self.item, self.application);
        self.guard(applies, branches)
    }

    pub fn is_attack(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::is_attack(self.item), branches)
    }

    pub fn is_save(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::is_save(self.item), branches)
    }

    pub fn is_self_target(&self, branches: impl IntoIterator<Item = Option<Branch>>) -> Option<Branch> {
        self.guard(predicates::is_self_target(self.item), branches)
    }

    pub fn is_token_targetable(
        &self,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        self.guard(predicates::is_token_targetable(self.item), branches)
    }

    pub fn is_immediate_application(
        &self,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        self.guard(self.application == ApplicationType::Immediate, branches)
    }

    pub fn is_delayed_application(
        &self,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        self.guard(self.application == ApplicationType::Delayed, branches)
    }

    pub fn is_over_time_application(
        &self,
        branches: impl IntoIterator<Item = Option<Branch>>,
    ) -> Option<Branch> {
        self.guard(self.application == ApplicationType::Overtime, branches)
    }

    // ===== operations =====

    fn op(&self, step: BuiltinStep, args: impl Into<StepArgs>) -> Option<Branch> {
        Some(Branch::Step(Step::new(step, args)))
    }

    pub fn apply_concentration(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplyConcentration, args)
    }

    pub fn apply_damage(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplyDamage, args)
    }

    pub fn apply_default_targets(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplyDefaultTargets, args)
    }

    pub fn apply_default_targets_as_effective(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplyDefaultTargetsAsEffective, args)
    }

    pub fn apply_duration_effect(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplyDurationEffect, args)
    }

    pub fn apply_effects(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplyEffects, args)
    }

    pub fn apply_selected_targets(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ApplySelectedTargets, args)
    }

    pub fn confirm_targets(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::ConfirmTargets, args)
    }

    pub fn end_effect(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::EndEffect, args)
    }

    pub fn end_effect_on_save(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::EndEffectOnSave, args)
    }

    pub fn perform_attack_roll(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::PerformAttackRoll, args)
    }

    /// Absent unless the item deals damage in this phase.
    pub fn perform_attack_damage_roll(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        if predicates::has_damage_of_type(self.item, self.application) {
            self.op(BuiltinStep::PerformAttackDamageRoll, args)
        } else {
            None
        }
    }

    /// Absent unless the item deals damage in this phase.
    pub fn perform_save_damage_roll(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        if predicates::has_damage_of_type(self.item, self.application) {
            self.op(BuiltinStep::PerformSaveDamageRoll, args)
        } else {
            None
        }
    }

    pub fn perform_saving_throw(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::PerformSavingThrow, args)
    }

    pub fn trigger_action(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::TriggerAction, args)
    }

    pub fn attack_completed(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::AttackCompleted, args)
    }

    pub fn place_template(&self, args: impl Into<StepArgs>) -> Option<Branch> {
        self.op(BuiltinStep::PlaceTemplate, args)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::flow::StepArg;
    use crate::state::ItemId;

    fn step(name: &str) -> Option<Branch> {
        Some(Branch::Step(Step::new(name, ())))
    }

    #[test]
    fn pick_short_circuits() {
        let item = ItemTraits::new(ItemId(1), "Dagger");
        let flow: Flow<'_, ()> = Flow::new(&item, ApplicationType::Immediate);
        let built = Cell::new(0);

        let branches: [Box<dyn FnOnce() -> Option<Branch> + '_>; 3] = [
            Box::new(|| None),
            Box::new(|| {
                built.set(built.get() + 1);
                step("first")
            }),
            Box::new(|| {
                built.set(built.get() + 1);
                step("second")
            }),
        ];
        let picked = flow.pick_lazy(branches);

        assert_eq!(picked, step("first"));
        assert_eq!(built.get(), 1);
        assert_eq!(flow.pick([None, step("a"), step("b")]), step("a"));
        assert_eq!(flow.pick([None, None]), None);
    }

    #[test]
    fn sequence_keeps_order_and_drops_absent() {
        let item = ItemTraits::new(ItemId(1), "Dagger");
        let flow: Flow<'_, ()> = Flow::new(&item, ApplicationType::Immediate);

        assert_eq!(
            flow.sequence([step("a"), None, step("b")]),
            Some(Branch::Seq(vec![Branch::Step(Step::new("a", ())), Branch::Step(Step::new("b", ()))]))
        );
        assert_eq!(flow.sequence([None]), Some(Branch::empty()));
    }

    #[test]
    fn false_guard_yields_nothing() {
        let item = ItemTraits::new(ItemId(1), "Dagger");
        let flow: Flow<'_, ()> = Flow::new(&item, ApplicationType::Immediate);

        assert_eq!(flow.has_damage([flow.apply_damage(())]), None);
        assert_eq!(flow.perform_attack_damage_roll(()), None);
        assert_eq!(
            flow.is_immediate_application([flow.apply_effects(())]),
            flow.apply_effects(())
        );
    }

    #[test]
    fn operations_take_the_first_truthy_argument() {
        let item = ItemTraits::new(ItemId(1), "Dagger");
        let flow: Flow<'_, ()> = Flow::new(&item, ApplicationType::Immediate);

        let branch = flow.confirm_targets(vec![
            StepArg::from(""),
            StepArg::List(vec![StepArg::from("enemies"), StepArg::Bool(false)]),
        ]);
        assert_eq!(
            branch,
            Some(Branch::Step(Step {
                name: StepName::Builtin(BuiltinStep::ConfirmTargets),
                args: vec![StepArg::from("enemies")],
            }))
        );
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let item = ItemTraits::new(ItemId(1), "Dagger");
        let mut flow = Flow::new(&item, ApplicationType::Immediate);
        flow.register_flow_step("summon", false, 1);
        flow.register_flow_step("summon", true, 2);
        flow.skip_configuration_dialog();
        flow.select_variant(["small", "large"]);

        let custom = &flow.custom_steps()["summon"];
        assert_eq!((custom.run_as_privileged, custom.executor), (true, 2));
        assert!(flow.pre_roll_options().skip_configuration_dialog);
        assert_eq!(flow.pre_roll_options().variant_options, ["small", "large"]);
    }
}
