//! Actor records: hit points, ownership and damage traits.

use std::collections::{BTreeMap, BTreeSet};

use crate::damage::DamageKind;
use crate::error::AuthorizationError;
use crate::state::{ActorId, EffectId, UserId};

/// Hit point pool of an actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitPoints {
    pub value: i32,
    pub max: i32,
    pub temp: i32,
    /// Temporary bonus (or penalty) to the maximum.
    pub temp_max: i32,
}

impl HitPoints {
    pub const fn new(value: i32, max: i32) -> Self {
        Self {
            value,
            max,
            temp: 0,
            temp_max: 0,
        }
    }

    pub const fn with_temp(mut self, temp: i32) -> Self {
        self.temp = temp;
        self
    }

    /// Base maximum plus the temporary maximum bonus, never below zero.
    pub fn effective_max(&self) -> i32 {
        (self.max + self.temp_max).max(0)
    }
}

/// Damage kinds an actor ignores, halves or doubles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageTraits {
    pub immunities: BTreeSet<DamageKind>,
    pub resistances: BTreeSet<DamageKind>,
    pub vulnerabilities: BTreeSet<DamageKind>,
}

/// Actor record as exposed by the document store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorState {
    pub id: ActorId,
    pub name: String,
    pub hp: HitPoints,
    pub armor_class: i32,
    /// Saving throw bonus per ability (e.g. `"dex"`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub saves: BTreeMap<String, i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: DamageTraits,
    /// Users with owner permission on this actor.
    #[cfg_attr(feature = "serde", serde(default))]
    pub owners: BTreeSet<UserId>,
    /// True when at least one non-privileged user owns the actor.
    #[cfg_attr(feature = "serde", serde(default))]
    pub player_owned: bool,
    /// Effects this actor cast that update on turn changes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub turn_updated_effects: Vec<EffectId>,
}

impl ActorState {
    pub fn new(id: ActorId, name: impl Into<String>, hp: HitPoints) -> Self {
        Self {
            id,
            name: name.into(),
            hp,
            armor_class: 10,
            saves: BTreeMap::new(),
            traits: DamageTraits::default(),
            owners: BTreeSet::new(),
            player_owned: false,
            turn_updated_effects: Vec::new(),
        }
    }

    pub fn with_owner(mut self, user: UserId) -> Self {
        self.owners.insert(user);
        self.player_owned = true;
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_save(mut self, ability: impl Into<String>, bonus: i32) -> Self {
        self.saves.insert(ability.into(), bonus);
        self
    }

    pub fn save_bonus(&self, ability: &str) -> i32 {
        self.saves.get(ability).copied().unwrap_or(0)
    }

    pub fn with_traits(mut self, traits: DamageTraits) -> Self {
        self.traits = traits;
        self
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owners.contains(&user)
    }
}

/// Permission level of a connected user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UserRole {
    #[default]
    Player,
    Trusted,
    Assistant,
    Gamemaster,
}

/// The user on whose behalf an operation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
}

impl User {
    pub const fn new(id: UserId, role: UserRole) -> Self {
        Self { id, role }
    }

    pub const fn player(id: UserId) -> Self {
        Self::new(id, UserRole::Player)
    }

    pub const fn gamemaster(id: UserId) -> Self {
        Self::new(id, UserRole::Gamemaster)
    }

    /// Assistants and gamemasters may mutate any shared record.
    pub fn is_privileged(&self) -> bool {
        self.role >= UserRole::Assistant
    }

    /// Only the privileged user or an owner of the actor may modify it.
    pub fn authorize(&self, actor: &ActorState) -> Result<(), AuthorizationError> {
        if self.is_privileged() || actor.is_owned_by(self.id) {
            Ok(())
        } else {
            Err(AuthorizationError {
                user: self.id,
                actor: actor.id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners_and_privileged_users_are_authorized() {
        let actor = ActorState::new(ActorId(1), "Fighter", HitPoints::new(10, 10))
            .with_owner(UserId(5));

        assert!(User::player(UserId(5)).authorize(&actor).is_ok());
        assert!(User::gamemaster(UserId(1)).authorize(&actor).is_ok());
        assert_eq!(
            User::player(UserId(6)).authorize(&actor),
            Err(AuthorizationError {
                user: UserId(6),
                actor: ActorId(1)
            })
        );
    }

    #[test]
    fn effective_max_includes_temporary_bonus() {
        let mut hp = HitPoints::new(4, 10);
        hp.temp_max = 5;
        assert_eq!(hp.effective_max(), 15);
        hp.temp_max = -20;
        assert_eq!(hp.effective_max(), 0);
    }
}
