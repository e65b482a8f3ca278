//! Built-in flows: the standard item roll, plus the flows condition update
//! actions run when a trigger fires.

use super::{Branch, Evaluator, Flow, StepArg};
use crate::item::ApplicationType;
use crate::trigger::UpdateAction;

/// The evaluators shipped with the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DefaultFlow {
    /// Targeting, rolls, damage and effects for one application phase.
    ItemRoll,
    /// Effects of a phase on the effect bearer, with a save if one applies.
    EffectsOnly,
    EndEffect,
    EndEffectOnSave,
    /// Delayed application spreading from the bearer into an area.
    Splash,
}

impl DefaultFlow {
    /// Flow and phase an update action runs.
    pub const fn for_update(action: UpdateAction) -> (Self, ApplicationType) {
        match action {
            UpdateAction::ApplyDelayed => (Self::ItemRoll, ApplicationType::Delayed),
            UpdateAction::ApplyOvertime => (Self::ItemRoll, ApplicationType::Overtime),
            UpdateAction::ApplyEffectsImmediate => (Self::EffectsOnly, ApplicationType::Immediate),
            UpdateAction::ApplyEffectsDelayed => (Self::EffectsOnly, ApplicationType::Delayed),
            UpdateAction::ApplyEffectsOvertime => (Self::EffectsOnly, ApplicationType::Overtime),
            UpdateAction::End => (Self::EndEffect, ApplicationType::Overtime),
            UpdateAction::EndOnSave => (Self::EndEffectOnSave, ApplicationType::Overtime),
            UpdateAction::SplashDelayed => (Self::Splash, ApplicationType::Delayed),
        }
    }
}

impl<X> Evaluator<X> for DefaultFlow {
    fn evaluate(&self, flow: &mut Flow<'_, X>) -> Option<Branch> {
        let f = &*flow;
        match self {
            Self::ItemRoll => item_roll(f),
            Self::EffectsOnly => f.sequence([
                f.apply_default_targets_as_effective(()),
                f.has_saveable_applications([f.perform_saving_throw(())]),
                f.apply_effects(()),
            ]),
            Self::EndEffect => f.end_effect(()),
            Self::EndEffectOnSave => f.has_save([f.sequence([
                f.perform_saving_throw(()),
                f.end_effect_on_save(()),
            ])]),
            Self::Splash => f.sequence([
                f.place_template(StepArg::from("splash")),
                f.confirm_targets(()),
                resolution(f),
            ]),
        }
    }
}

fn item_roll<X>(f: &Flow<'_, X>) -> Option<Branch> {
    f.sequence([
        f.is_immediate_application([f.sequence([
            f.has_concentration([f.apply_concentration(())]),
            f.has_duration([f.apply_duration_effect(())]),
        ])]),
        targeting(f),
        resolution(f),
        f.is_over_time_application([f.has_save([f.end_effect_on_save(())])]),
    ])
}

/// Later phases act on whoever bears the effect.
fn targeting<X>(f: &Flow<'_, X>) -> Option<Branch> {
    f.pick([
        f.is_immediate_application([f.pick([
            f.is_self_target([f.apply_default_targets_as_effective(())]),
            f.has_area_target([f.sequence([f.place_template(()), f.confirm_targets(())])]),
            f.is_token_targetable([f.sequence([
                f.apply_selected_targets(()),
                f.confirm_targets(()),
            ])]),
            f.apply_default_targets(()),
        ])]),
        f.apply_default_targets_as_effective(()),
    ])
}

fn resolution<X>(f: &Flow<'_, X>) -> Option<Branch> {
    f.pick([
        f.is_attack([f.sequence([
            f.perform_attack_roll(()),
            f.trigger_action(()),
            f.perform_attack_damage_roll(()),
            f.attack_completed(()),
            f.has_damage([f.apply_damage(())]),
            f.has_damage_or_effects([f.apply_effects(())]),
        ])]),
        f.has_damage_or_effects([f.pick([
            f.is_save([f.sequence([
                f.has_saveable_applications([f.perform_saving_throw(())]),
                f.perform_save_damage_roll(()),
                f.has_damage([f.apply_damage(())]),
                f.apply_effects(()),
            ])]),
            f.sequence([
                f.perform_save_damage_roll(()),
                f.has_damage([f.apply_damage(())]),
                f.apply_effects(()),
            ]),
        ])]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::damage::DamageKind;
    use crate::flow::{BuiltinStep, Plan, build_plan};
    use crate::item::{
        ActionType, DamagePart, DurationSpec, DurationUnits, EffectTemplate, ItemTraits, SaveSpec,
        TargetShape, TargetSpec,
    };
    use crate::state::ItemId;

    fn plan(item: &ItemTraits, application: ApplicationType, flow: DefaultFlow) -> Plan {
        build_plan::<()>(item, application, &flow, None, &RulesConfig::default())
            .unwrap()
            .plan
    }

    fn names(plan: &Plan) -> Vec<String> {
        plan.iter().map(|step| step.name.to_string()).collect()
    }

    fn damage(kind: DamageKind, application: ApplicationType) -> DamagePart {
        DamagePart {
            formula: "2d6".into(),
            kind,
            application,
            halved_on_save: true,
        }
    }

    fn fireball() -> ItemTraits {
        let mut item = ItemTraits::new(ItemId(3), "Fireball");
        item.action_type = Some(ActionType::Save);
        item.target = TargetSpec::new(TargetShape::Sphere, Some(20));
        item.save = Some(SaveSpec {
            ability: "dex".into(),
            dc: 15,
        });
        item.damage.push(damage(DamageKind::Fire, ApplicationType::Immediate));
        item
    }

    #[test]
    fn attack_plan_order() {
        let mut item = ItemTraits::new(ItemId(1), "Longbow");
        item.action_type = Some(ActionType::RangedWeaponAttack);
        item.target = TargetSpec::new(TargetShape::Creature, Some(1));
        item.damage.push(damage(DamageKind::Piercing, ApplicationType::Immediate));

        assert_eq!(
            names(&plan(&item, ApplicationType::Immediate, DefaultFlow::ItemRoll)),
            [
                "applySelectedTargets",
                "confirmTargets",
                "performAttackRoll",
                "triggerAction",
                "performAttackDamageRoll",
                "attackCompleted",
                "applyDamage",
                "applyEffects",
            ]
        );
    }

    #[test]
    fn area_save_plan_places_a_template() {
        assert_eq!(
            names(&plan(&fireball(), ApplicationType::Immediate, DefaultFlow::ItemRoll)),
            [
                "placeTemplate",
                "confirmTargets",
                "performSavingThrow",
                "performSaveDamageRoll",
                "applyDamage",
                "applyEffects",
            ]
        );
    }

    #[test]
    fn damage_without_save_never_rolls_a_saving_throw() {
        let mut item = ItemTraits::new(ItemId(4), "Magic Missile");
        item.action_type = Some(ActionType::Other);
        item.target = TargetSpec::new(TargetShape::Creature, Some(3));
        item.damage.push(damage(DamageKind::Force, ApplicationType::Immediate));

        let plan = plan(&item, ApplicationType::Immediate, DefaultFlow::ItemRoll);
        assert!(plan.contains(BuiltinStep::ApplyDamage));
        assert!(!plan.contains(BuiltinStep::PerformSavingThrow));
    }

    #[test]
    fn phases_only_include_their_own_applications() {
        let mut item = fireball();
        item.concentration = true;
        item.duration = Some(DurationSpec::new(Some(1), DurationUnits::Minute));
        item.effects.push(EffectTemplate {
            label: "Burning".into(),
            application: ApplicationType::Overtime,
            saveable: true,
            aura: None,
            conditions: Vec::new(),
        });

        let immediate = plan(&item, ApplicationType::Immediate, DefaultFlow::ItemRoll);
        assert_eq!(
            names(&immediate)[..2],
            ["applyConcentration", "applyDurationEffect"]
        );
        assert!(!immediate.contains(BuiltinStep::EndEffectOnSave));

        let overtime = plan(&item, ApplicationType::Overtime, DefaultFlow::ItemRoll);
        assert_eq!(
            names(&overtime),
            [
                "applyDefaultTargetsAsEffective",
                "performSavingThrow",
                "applyEffects",
                "endEffectOnSave",
            ]
        );
    }

    #[test]
    fn plans_are_deterministic() {
        let item = fireball();
        let first = plan(&item, ApplicationType::Immediate, DefaultFlow::ItemRoll);
        let second = plan(&item, ApplicationType::Immediate, DefaultFlow::ItemRoll);
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn update_actions_map_to_flows() {
        assert_eq!(
            DefaultFlow::for_update(UpdateAction::ApplyOvertime),
            (DefaultFlow::ItemRoll, ApplicationType::Overtime)
        );

        let end = plan(&fireball(), ApplicationType::Overtime, DefaultFlow::EndEffectOnSave);
        assert_eq!(names(&end), ["performSavingThrow", "endEffectOnSave"]);

        let no_save = ItemTraits::new(ItemId(5), "Web");
        assert!(plan(&no_save, ApplicationType::Overtime, DefaultFlow::EndEffectOnSave).is_empty());
    }
}
