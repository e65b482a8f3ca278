//! Active effects and the metadata flags the activation flow attaches to them.

use crate::item::{ApplicationType, DurationSpec};
use crate::state::{ActivationId, ActorId, EffectId, ItemId, TemplateId};
use crate::trigger::Condition;

/// Which tokens an aura source affects, relative to its own token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AuraDisposition {
    Ally,
    Enemy,
    Creature,
}

/// Marks an effect as an aura source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraTag {
    /// Reach in distance units, taken from the originating item's target value.
    pub range: u32,
    pub disposition: AuraDisposition,
}

/// Bookkeeping flags attached to effects created by activations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectFlags {
    /// Duration effect that owns a template and child effects.
    pub is_master: bool,
    pub template: Option<TemplateId>,
    pub child_effects: Vec<EffectId>,
    /// Caster whose turn tracking references this effect.
    pub casting_actor: Option<ActorId>,
    pub activation: Option<ActivationId>,
    pub application: Option<ApplicationType>,
    pub conditions: Vec<Condition>,
    pub concentration: bool,
    /// Present when this effect radiates an aura.
    pub aura: Option<AuraTag>,
    /// Present when this effect was granted by an aura source.
    pub aura_source: Option<EffectId>,
}

/// Active effect carried by an actor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectState {
    pub id: EffectId,
    pub actor: ActorId,
    pub label: String,
    /// Item the effect was created from.
    pub origin: Option<ItemId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub disabled: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<DurationSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: EffectFlags,
}

impl EffectState {
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Enabled effect tagged as an aura.
    pub fn aura(&self) -> Option<AuraTag> {
        self.flags.aura.filter(|_| self.is_enabled())
    }

    pub fn is_aura_derived(&self) -> bool {
        self.flags.aura_source.is_some()
    }
}

/// Effect to be created; the store assigns the identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewEffect {
    pub actor: ActorId,
    pub label: String,
    pub origin: Option<ItemId>,
    pub disabled: bool,
    pub duration: Option<DurationSpec>,
    pub flags: EffectFlags,
}

impl NewEffect {
    pub fn new(actor: ActorId, label: impl Into<String>) -> Self {
        Self {
            actor,
            label: label.into(),
            origin: None,
            disabled: false,
            duration: None,
            flags: EffectFlags::default(),
        }
    }

    pub fn with_origin(mut self, origin: ItemId) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_duration(mut self, duration: Option<DurationSpec>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_flags(mut self, flags: EffectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn into_state(self, id: EffectId) -> EffectState {
        EffectState {
            id,
            actor: self.actor,
            label: self.label,
            origin: self.origin,
            disabled: self.disabled,
            duration: self.duration,
            flags: self.flags,
        }
    }
}
