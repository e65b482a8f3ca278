//! Item trait snapshots.
//!
//! An [`ItemTraits`] value is the read-only view of an item the flow builder
//! and the step executors consult. It is owned by the document store and is
//! never mutated by the core.

pub mod predicates;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::damage::DamageKind;
use crate::state::{AuraDisposition, ItemId};
use crate::trigger::Condition;

/// Phase of the turn sequence a plan is built for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ApplicationType {
    /// On use.
    #[default]
    Immediate,
    /// On a later trigger (turn boundary, area entry).
    Delayed,
    /// Every turn while the effect lasts.
    Overtime,
}

/// Rules category of the item's action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionType {
    #[strum(serialize = "mwak")]
    #[cfg_attr(feature = "serde", serde(rename = "mwak"))]
    MeleeWeaponAttack,
    #[strum(serialize = "rwak")]
    #[cfg_attr(feature = "serde", serde(rename = "rwak"))]
    RangedWeaponAttack,
    #[strum(serialize = "msak")]
    #[cfg_attr(feature = "serde", serde(rename = "msak"))]
    MeleeSpellAttack,
    #[strum(serialize = "rsak")]
    #[cfg_attr(feature = "serde", serde(rename = "rsak"))]
    RangedSpellAttack,
    #[strum(serialize = "save")]
    #[cfg_attr(feature = "serde", serde(rename = "save"))]
    Save,
    #[strum(serialize = "heal")]
    #[cfg_attr(feature = "serde", serde(rename = "heal"))]
    Heal,
    #[strum(serialize = "util")]
    #[cfg_attr(feature = "serde", serde(rename = "util"))]
    Utility,
    #[strum(serialize = "other")]
    #[cfg_attr(feature = "serde", serde(rename = "other"))]
    Other,
}

impl ActionType {
    pub fn is_attack(self) -> bool {
        matches!(
            self,
            Self::MeleeWeaponAttack
                | Self::RangedWeaponAttack
                | Self::MeleeSpellAttack
                | Self::RangedSpellAttack
        )
    }
}

/// What an item targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetShape {
    #[default]
    None,
    #[strum(serialize = "self")]
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    Caster,
    Creature,
    Ally,
    Enemy,
    Object,
    Radius,
    Sphere,
    Cylinder,
    Cone,
    Square,
    Cube,
    Line,
    Wall,
}

impl TargetShape {
    /// Shapes resolved by placing a measured template.
    pub fn is_area(self) -> bool {
        matches!(
            self,
            Self::Radius
                | Self::Sphere
                | Self::Cylinder
                | Self::Cone
                | Self::Square
                | Self::Cube
                | Self::Line
                | Self::Wall
        )
    }

    /// Shapes resolved by picking individual tokens.
    pub fn is_token(self) -> bool {
        matches!(self, Self::Creature | Self::Ally | Self::Enemy | Self::Object)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetSpec {
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub shape: TargetShape,
}

impl TargetSpec {
    pub const fn new(shape: TargetShape, value: Option<u32>) -> Self {
        Self { value, shape }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DurationUnits {
    #[strum(serialize = "inst")]
    #[cfg_attr(feature = "serde", serde(rename = "inst"))]
    Instantaneous,
    Turn,
    Round,
    Minute,
    Hour,
    Day,
    #[strum(serialize = "perm")]
    #[cfg_attr(feature = "serde", serde(rename = "perm"))]
    Permanent,
    #[strum(serialize = "spec")]
    #[cfg_attr(feature = "serde", serde(rename = "spec"))]
    Special,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurationSpec {
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<u32>,
    pub units: DurationUnits,
}

impl DurationSpec {
    pub const fn new(value: Option<u32>, units: DurationUnits) -> Self {
        Self { value, units }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaveSpec {
    pub ability: String,
    pub dc: i32,
}

/// One damage (or healing) formula of an item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamagePart {
    pub formula: String,
    pub kind: DamageKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub application: ApplicationType,
    /// A successful save halves this part instead of negating it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub halved_on_save: bool,
}

/// Effect an item applies to its targets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTemplate {
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub application: ApplicationType,
    /// A successful save prevents this effect.
    #[cfg_attr(feature = "serde", serde(default))]
    pub saveable: bool,
    /// Radiates an aura over tokens matching the disposition.
    #[cfg_attr(feature = "serde", serde(default))]
    pub aura: Option<AuraDisposition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditions: Vec<Condition>,
}

/// Read-only trait snapshot of an item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ItemTraits {
    pub id: ItemId,
    pub name: String,
    pub action_type: Option<ActionType>,
    /// Added to the d20 of attack rolls.
    pub attack_bonus: i32,
    pub target: TargetSpec,
    pub duration: Option<DurationSpec>,
    pub concentration: bool,
    pub save: Option<SaveSpec>,
    pub damage: Vec<DamagePart>,
    pub effects: Vec<EffectTemplate>,
    /// Per-item condition configuration (trigger → update action).
    pub conditions: Vec<Condition>,
    /// Item-supplied flow override, handed to the host's evaluator capability.
    pub macro_source: Option<String>,
}

impl ItemTraits {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn damage_parts(&self, application: ApplicationType) -> impl Iterator<Item = &DamagePart> {
        self.damage
            .iter()
            .filter(move |part| part.application == application)
    }

    pub fn effect_templates(
        &self,
        application: ApplicationType,
    ) -> impl Iterator<Item = &EffectTemplate> {
        self.effects
            .iter()
            .filter(move |effect| effect.application == application)
    }

    /// Trimmed macro body, if any.
    pub fn macro_body(&self) -> Option<&str> {
        self.macro_source
            .as_deref()
            .map(str::trim)
            .filter(|body| !body.is_empty())
    }
}
