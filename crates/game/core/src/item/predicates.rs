//! Predicate library: pure questions about an item's traits.
//!
//! Every function here is total and side-effect free. The flow builder uses
//! them as branch guards, and the step executors use them to decide what a
//! step has to do for a given application phase.

use super::{ApplicationType, DurationUnits, ItemTraits};

pub fn has_area_target(item: &ItemTraits) -> bool {
    item.target.shape.is_area()
}

pub fn has_concentration(item: &ItemTraits) -> bool {
    item.concentration
}

pub fn has_damage_of_type(item: &ItemTraits, application: ApplicationType) -> bool {
    item.damage_parts(application).next().is_some()
}

pub fn has_effects_of_type(item: &ItemTraits, application: ApplicationType) -> bool {
    item.effect_templates(application).next().is_some()
}

/// Lasting duration; instantaneous items have none.
pub fn has_duration(item: &ItemTraits) -> bool {
    item.duration
        .is_some_and(|duration| duration.units != DurationUnits::Instantaneous)
}

pub fn has_save(item: &ItemTraits) -> bool {
    item.save.is_some()
}

/// Damage or effects of this phase that a saving throw can mitigate.
pub fn has_saveable_applications_of_type(item: &ItemTraits, application: ApplicationType) -> bool {
    has_damage_of_type(item, application)
        || item
            .effect_templates(application)
            .any(|effect| effect.saveable)
}

pub fn is_attack(item: &ItemTraits) -> bool {
    item.action_type.is_some_and(|kind| kind.is_attack())
}

pub fn is_save(item: &ItemTraits) -> bool {
    item.action_type == Some(super::ActionType::Save)
}

pub fn is_self_target(item: &ItemTraits) -> bool {
    item.target.shape == super::TargetShape::Caster
}

pub fn is_token_targetable(item: &ItemTraits) -> bool {
    item.target.shape.is_token()
}

/// Whether any effect of the item radiates an aura.
pub fn has_aura(item: &ItemTraits) -> bool {
    item.effects.iter().any(|effect| effect.aura.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageKind;
    use crate::item::{
        ActionType, DamagePart, DurationSpec, EffectTemplate, TargetShape, TargetSpec,
    };
    use crate::state::ItemId;

    fn fire_bolt() -> ItemTraits {
        let mut item = ItemTraits::new(ItemId(1), "Fire Bolt");
        item.action_type = Some(ActionType::RangedSpellAttack);
        item.target = TargetSpec::new(TargetShape::Creature, Some(1));
        item.damage.push(DamagePart {
            formula: "1d10".into(),
            kind: DamageKind::Fire,
            application: ApplicationType::Immediate,
            halved_on_save: false,
        });
        item
    }

    #[test]
    fn damage_is_scoped_to_application_phase() {
        let item = fire_bolt();
        assert!(has_damage_of_type(&item, ApplicationType::Immediate));
        assert!(!has_damage_of_type(&item, ApplicationType::Overtime));
        assert!(!has_effects_of_type(&item, ApplicationType::Immediate));
    }

    #[test]
    fn attack_and_targeting_predicates() {
        let item = fire_bolt();
        assert!(is_attack(&item));
        assert!(!is_save(&item));
        assert!(is_token_targetable(&item));
        assert!(!has_area_target(&item));
        assert!(!is_self_target(&item));
    }

    #[test]
    fn instantaneous_duration_does_not_count() {
        let mut item = fire_bolt();
        item.duration = Some(DurationSpec::new(None, DurationUnits::Instantaneous));
        assert!(!has_duration(&item));

        item.duration = Some(DurationSpec::new(Some(1), DurationUnits::Minute));
        assert!(has_duration(&item));
    }

    #[test]
    fn saveable_effects_count_as_saveable_applications() {
        let mut item = ItemTraits::new(ItemId(2), "Hold Person");
        item.effects.push(EffectTemplate {
            label: "Paralyzed".into(),
            application: ApplicationType::Overtime,
            saveable: true,
            aura: None,
            conditions: Vec::new(),
        });

        assert!(has_saveable_applications_of_type(&item, ApplicationType::Overtime));
        assert!(!has_saveable_applications_of_type(&item, ApplicationType::Immediate));
    }
}
