//! The trigger matrix: which update actions each condition event may fire.
//!
//! The matrix is pure data. Every condition event carries one applicability
//! tag and every update action carries a set of tags. A pair is legal when
//! the action is tagged `all` or tagged with the event's own family.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::ConfigurationError;

/// Applicability family of a matrix entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Applicability {
    All,
    /// Only meaningful on conditions stored on an active effect.
    Effect,
}

/// Where a condition list is stored; decides which events it may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConditionScope {
    Item,
    Effect,
}

impl ConditionScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Effect => "effect",
        }
    }

    fn admits(self, applicability: Applicability) -> bool {
        match applicability {
            Applicability::All => true,
            Applicability::Effect => self == Self::Effect,
        }
    }
}

/// Update actions a condition can fire.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum UpdateAction {
    ApplyDelayed,
    ApplyOvertime,
    ApplyEffectsImmediate,
    ApplyEffectsDelayed,
    ApplyEffectsOvertime,
    End,
    EndOnSave,
    SplashDelayed,
}

/// Condition event row of the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSpec {
    pub name: &'static str,
    pub applicability: Applicability,
}

/// Update action row of the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSpec {
    pub action: UpdateAction,
    pub applicability: &'static [Applicability],
}

impl ActionSpec {
    pub fn name(&self) -> &'static str {
        self.action.into()
    }

    fn pairs_with(&self, event: &EventSpec) -> bool {
        self.applicability
            .iter()
            .any(|tag| *tag == Applicability::All || *tag == event.applicability)
    }
}

/// Well-known condition event names.
pub mod events {
    pub const START_OF_TURN_CASTER: &str = "start-of-turn-caster";
    pub const END_OF_TURN_CASTER: &str = "end-of-turn-caster";
    pub const START_OF_TURN_TARGET: &str = "start-of-turn-target";
    pub const END_OF_TURN_TARGET: &str = "end-of-turn-target";
    pub const TARGET_ATTACKS: &str = "target-attacks";
    pub const TARGET_HITS: &str = "target-hits";
    pub const TARGET_IS_ATTACKED: &str = "target-is-attacked";
    pub const TARGET_IS_HIT: &str = "target-is-hit";
    pub const TAKE_AN_ACTION: &str = "take-an-action";
}

const fn event(name: &'static str, applicability: Applicability) -> EventSpec {
    EventSpec {
        name,
        applicability,
    }
}

const ALL: Applicability = Applicability::All;
const EFFECT: Applicability = Applicability::Effect;

/// Condition events known to the standard matrix.
pub const CONDITION_EVENTS: &[EventSpec] = &[
    event("creature-enters-area", ALL),
    event("creature-starts-turn-inside-area", ALL),
    event("creature-ends-turn-inside-area", ALL),
    event("ally-enters-area", ALL),
    event("ally-starts-turn-inside-area", ALL),
    event("ally-ends-turn-inside-area", ALL),
    event("enemy-enters-area", ALL),
    event("enemy-starts-turn-inside-area", ALL),
    event("enemy-ends-turn-inside-area", ALL),
    event("area-envelops-creature", ALL),
    event("area-envelops-ally", ALL),
    event("area-envelops-enemy", ALL),
    event("area-reveals-creature", ALL),
    event("area-reveals-ally", ALL),
    event("area-reveals-enemy", ALL),
    event(events::START_OF_TURN_CASTER, ALL),
    event(events::END_OF_TURN_CASTER, ALL),
    event(events::START_OF_TURN_TARGET, EFFECT),
    event(events::END_OF_TURN_TARGET, EFFECT),
    event("target-attacks.all", ALL),
    event("target-attacks.mwak", ALL),
    event("target-attacks.rwak", ALL),
    event("target-attacks.msak", ALL),
    event("target-attacks.rsak", ALL),
    event("target-hits.all", ALL),
    event("target-hits.mwak", ALL),
    event("target-hits.rwak", ALL),
    event("target-hits.msak", ALL),
    event("target-hits.rsak", ALL),
    event("target-is-attacked.all", ALL),
    event("target-is-attacked.mwak", ALL),
    event("target-is-attacked.rwak", ALL),
    event("target-is-attacked.msak", ALL),
    event("target-is-attacked.rsak", ALL),
    event("target-is-hit.all", ALL),
    event("target-is-hit.mwak", ALL),
    event("target-is-hit.rwak", ALL),
    event("target-is-hit.msak", ALL),
    event("target-is-hit.rsak", ALL),
    event(events::TAKE_AN_ACTION, ALL),
];

/// Update actions known to the standard matrix.
pub const UPDATE_ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        action: UpdateAction::ApplyDelayed,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::ApplyOvertime,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::ApplyEffectsImmediate,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::ApplyEffectsDelayed,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::ApplyEffectsOvertime,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::End,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::EndOnSave,
        applicability: &[ALL],
    },
    ActionSpec {
        action: UpdateAction::SplashDelayed,
        applicability: &[ALL],
    },
];

/// Static validation table over condition events and update actions.
#[derive(Clone, Copy, Debug)]
pub struct TriggerMatrix {
    events: &'static [EventSpec],
    actions: &'static [ActionSpec],
}

impl TriggerMatrix {
    /// The shipped matrix.
    pub const STANDARD: Self = Self::new(CONDITION_EVENTS, UPDATE_ACTIONS);

    pub const fn new(events: &'static [EventSpec], actions: &'static [ActionSpec]) -> Self {
        Self { events, actions }
    }

    pub fn event(&self, name: &str) -> Option<&EventSpec> {
        self.events.iter().find(|spec| spec.name == name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|spec| spec.name() == name)
    }

    /// Membership test; unknown names are never valid.
    pub fn is_valid_pair(&self, event: &str, action: &str) -> bool {
        self.check_pair(event, action).is_ok()
    }

    /// Same as [`Self::is_valid_pair`], reporting why a pair is rejected.
    pub fn check_pair(&self, event: &str, action: &str) -> Result<UpdateAction, ConfigurationError> {
        let event_spec = self
            .event(event)
            .ok_or_else(|| ConfigurationError::UnknownEvent(event.to_string()))?;
        let action_spec = self
            .action(action)
            .ok_or_else(|| ConfigurationError::UnknownAction(action.to_string()))?;

        if action_spec.pairs_with(event_spec) {
            Ok(action_spec.action)
        } else {
            Err(ConfigurationError::InvalidPair {
                event: event.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Events offered for a condition list stored in `scope`.
    pub fn events_for(&self, scope: ConditionScope) -> impl Iterator<Item = &EventSpec> + '_ {
        self.events
            .iter()
            .filter(move |spec| scope.admits(spec.applicability))
    }

    /// Update actions selectable for `event`; empty for unknown events.
    pub fn actions_for<'a>(&'a self, event: &str) -> impl Iterator<Item = &'a ActionSpec> + 'a {
        let event_spec = self.event(event).copied();
        self.actions
            .iter()
            .filter(move |action| event_spec.is_some_and(|spec| action.pairs_with(&spec)))
    }

    /// Checks that `event` may be used in a condition list stored in `scope`.
    pub fn check_scope(&self, event: &str, scope: ConditionScope) -> Result<(), ConfigurationError> {
        let spec = self
            .event(event)
            .ok_or_else(|| ConfigurationError::UnknownEvent(event.to_string()))?;
        if scope.admits(spec.applicability) {
            Ok(())
        } else {
            Err(ConfigurationError::OutOfScope {
                event: event.to_string(),
                scope: scope.as_str().to_string(),
            })
        }
    }
}

impl Default for TriggerMatrix {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Whether a configured event name listens to a fired event.
///
/// `family.all` listens to every `family.<kind>`; other names match exactly.
pub fn event_matches(configured: &str, fired: &str) -> bool {
    if configured == fired {
        return true;
    }
    match (configured.split_once('.'), fired.split_once('.')) {
        (Some((family, "all")), Some((fired_family, _))) => family == fired_family,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_hit_pairs_with_immediate_effects() {
        let matrix = TriggerMatrix::STANDARD;
        assert!(matrix.is_valid_pair("target-hits.rwak", "apply-effects-immediate"));
        assert!(matrix.is_valid_pair("target-hits.rwak", "splash-delayed"));
    }

    #[test]
    fn action_family_tags_restrict_pairs() {
        static ACTIONS: &[ActionSpec] = &[
            ActionSpec {
                action: UpdateAction::ApplyEffectsImmediate,
                applicability: &[Applicability::All],
            },
            ActionSpec {
                action: UpdateAction::SplashDelayed,
                applicability: &[Applicability::Effect],
            },
        ];
        let matrix = TriggerMatrix::new(CONDITION_EVENTS, ACTIONS);

        assert!(matrix.is_valid_pair("target-hits.rwak", "apply-effects-immediate"));
        assert!(!matrix.is_valid_pair("target-hits.rwak", "splash-delayed"));
        assert!(matrix.is_valid_pair("start-of-turn-target", "splash-delayed"));
        assert_eq!(
            matrix
                .actions_for("target-hits.rwak")
                .map(ActionSpec::name)
                .collect::<Vec<_>>(),
            vec!["apply-effects-immediate"]
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        let matrix = TriggerMatrix::STANDARD;
        assert!(!matrix.is_valid_pair("target-dances.rwak", "end"));
        assert_eq!(
            matrix.check_pair("target-hits.rwak", "explode"),
            Err(ConfigurationError::UnknownAction("explode".into()))
        );
        assert_eq!(matrix.actions_for("nonsense").count(), 0);
    }

    #[test]
    fn effect_scoped_events_are_hidden_from_items() {
        let matrix = TriggerMatrix::STANDARD;
        let item_events: Vec<_> = matrix.events_for(ConditionScope::Item).map(|e| e.name).collect();
        assert!(!item_events.contains(&events::START_OF_TURN_TARGET));
        assert!(item_events.contains(&events::START_OF_TURN_CASTER));
        assert_eq!(
            matrix.events_for(ConditionScope::Effect).count(),
            CONDITION_EVENTS.len()
        );
        assert!(matrix
            .check_scope(events::END_OF_TURN_TARGET, ConditionScope::Item)
            .is_err());
    }

    #[test]
    fn all_namespace_listens_to_every_kind() {
        assert!(event_matches("target-hits.all", "target-hits.rwak"));
        assert!(event_matches("target-hits.msak", "target-hits.msak"));
        assert!(!event_matches("target-hits.msak", "target-hits.rwak"));
        assert!(!event_matches("target-hits.all", "target-is-hit.rwak"));
    }
}
