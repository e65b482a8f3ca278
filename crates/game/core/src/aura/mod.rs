//! Aura reconciliation planning.
//!
//! [`plan_reconciliation`] reads a snapshot of tokens and effects and returns
//! the minimal set of aura grants to create and aura-derived effects to
//! remove. Applying the delta and planning again on the result yields an empty
//! delta.
//!
//! Grants are keyed by `(source effect, target actor)`: an actor with several
//! tokens on the scene receives one grant when any of its tokens is in range
//! of any token of the source's actor.

mod distance;

use std::collections::{BTreeMap, BTreeSet};

pub use distance::{separation, within_range};

use crate::config::RulesConfig;
use crate::state::{
    ActorId, AuraDisposition, AuraTag, EffectFlags, EffectId, EffectState, ItemId, NewEffect,
    TokenState,
};

/// An aura-derived effect to create.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraGrant {
    pub source: EffectId,
    pub target: ActorId,
    pub label: String,
    pub origin: Option<ItemId>,
}

impl AuraGrant {
    pub fn into_new_effect(self) -> NewEffect {
        let effect = NewEffect::new(self.target, self.label).with_flags(EffectFlags {
            aura_source: Some(self.source),
            ..EffectFlags::default()
        });
        match self.origin {
            Some(origin) => effect.with_origin(origin),
            None => effect,
        }
    }
}

/// Changes that bring aura-derived effects in line with the scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuraDelta {
    pub create: Vec<AuraGrant>,
    pub remove: Vec<EffectId>,
}

impl AuraDelta {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.remove.is_empty()
    }
}

fn admits(filter: AuraDisposition, source: &TokenState, target: &TokenState) -> bool {
    match filter {
        AuraDisposition::Ally => target.disposition.is_ally_of(source.disposition),
        AuraDisposition::Enemy => target.disposition.is_enemy_of(source.disposition),
        AuraDisposition::Creature => true,
    }
}

fn reaches(
    tag: AuraTag,
    sources: &[&TokenState],
    targets: &[&TokenState],
    rules: &RulesConfig,
) -> bool {
    sources.iter().any(|source| {
        targets.iter().any(|target| {
            admits(tag.disposition, source, target)
                && within_range(source.position, target.position, tag.range, rules)
        })
    })
}

/// Computes the aura delta for a scene snapshot.
pub fn plan_reconciliation(
    tokens: &[TokenState],
    effects: &[EffectState],
    rules: &RulesConfig,
) -> AuraDelta {
    let mut tokens_by_actor: BTreeMap<ActorId, Vec<&TokenState>> = BTreeMap::new();
    for token in tokens {
        tokens_by_actor.entry(token.actor).or_default().push(token);
    }

    let sources: BTreeMap<EffectId, (&EffectState, AuraTag)> = effects
        .iter()
        .filter(|effect| !effect.is_aura_derived())
        .filter_map(|effect| effect.aura().map(|tag| (effect.id, (effect, tag))))
        .collect();

    let mut desired = BTreeSet::new();
    for (source_id, (source, tag)) in &sources {
        let Some(source_tokens) = tokens_by_actor.get(&source.actor) else {
            continue;
        };
        for (actor, target_tokens) in &tokens_by_actor {
            if reaches(*tag, source_tokens, target_tokens, rules) {
                desired.insert((*source_id, *actor));
            }
        }
    }

    let mut derived: Vec<&EffectState> = effects
        .iter()
        .filter(|effect| effect.is_aura_derived())
        .collect();
    derived.sort_by_key(|effect| effect.id);

    let mut delta = AuraDelta::default();
    let mut present = BTreeSet::new();
    for effect in derived {
        let Some(source) = effect.flags.aura_source else {
            continue;
        };
        let key = (source, effect.actor);
        if desired.contains(&key) && present.insert(key) {
            continue;
        }
        delta.remove.push(effect.id);
    }

    delta.create = desired
        .difference(&present)
        .filter_map(|(source_id, target)| {
            sources.get(source_id).map(|(source, _)| AuraGrant {
                source: *source_id,
                target: *target,
                label: source.label.clone(),
                origin: source.origin,
            })
        })
        .collect();

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Disposition, Position, TokenId};

    struct Scene {
        tokens: Vec<TokenState>,
        effects: Vec<EffectState>,
        next_effect: u64,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                tokens: Vec::new(),
                effects: Vec::new(),
                next_effect: 100,
            }
        }

        fn token(&mut self, id: u64, x: i32, y: i32, disposition: Disposition) {
            self.tokens.push(TokenState::new(
                TokenId(id),
                ActorId(id),
                Position::new(x, y),
                disposition,
            ));
        }

        fn aura(&mut self, id: u64, actor: u64, range: u32, disposition: AuraDisposition) {
            let mut effect = NewEffect::new(ActorId(actor), "Spirit Guardians").into_state(EffectId(id));
            effect.flags.aura = Some(AuraTag { range, disposition });
            self.effects.push(effect);
        }

        fn apply(&mut self, delta: AuraDelta) {
            self.effects.retain(|effect| !delta.remove.contains(&effect.id));
            for grant in delta.create {
                self.next_effect += 1;
                self.effects
                    .push(grant.into_new_effect().into_state(EffectId(self.next_effect)));
            }
        }

        fn reconcile(&mut self, rules: &RulesConfig) -> AuraDelta {
            let delta = plan_reconciliation(&self.tokens, &self.effects, rules);
            self.apply(delta.clone());
            delta
        }

        fn grants(&self) -> Vec<(EffectId, ActorId)> {
            let mut grants: Vec<_> = self
                .effects
                .iter()
                .filter_map(|e| e.flags.aura_source.map(|source| (source, e.actor)))
                .collect();
            grants.sort();
            grants
        }
    }

    #[test]
    fn enemy_aura_reaches_only_hostile_tokens_in_range() {
        let rules = RulesConfig::default();
        let mut scene = Scene::new();
        scene.token(1, 0, 0, Disposition::Friendly);
        scene.token(2, 1, 1, Disposition::Hostile);
        scene.token(3, 2, 0, Disposition::Friendly);
        scene.token(4, 9, 9, Disposition::Hostile);
        scene.aura(10, 1, 10, AuraDisposition::Enemy);

        scene.reconcile(&rules);
        assert_eq!(scene.grants(), [(EffectId(10), ActorId(2))]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let rules = RulesConfig::default();
        let mut scene = Scene::new();
        scene.token(1, 0, 0, Disposition::Friendly);
        scene.token(2, 1, 0, Disposition::Friendly);
        scene.aura(10, 1, 5, AuraDisposition::Ally);

        assert_eq!(scene.reconcile(&rules).create.len(), 2);
        assert!(scene.reconcile(&rules).is_empty());
    }

    #[test]
    fn moving_out_of_range_retires_the_grant() {
        let rules = RulesConfig::default();
        let mut scene = Scene::new();
        scene.token(1, 0, 0, Disposition::Friendly);
        scene.token(2, 1, 0, Disposition::Hostile);
        scene.aura(10, 1, 5, AuraDisposition::Creature);
        scene.reconcile(&rules);

        scene.tokens[1].position = Position::new(5, 0);
        let delta = scene.reconcile(&rules);
        assert_eq!(delta.remove.len(), 1);
        assert!(delta.create.is_empty());
        assert_eq!(scene.grants(), [(EffectId(10), ActorId(1))]);
    }

    #[test]
    fn disabled_or_deleted_sources_lose_their_grants() {
        let rules = RulesConfig::default();
        let mut scene = Scene::new();
        scene.token(1, 0, 0, Disposition::Friendly);
        scene.token(2, 1, 0, Disposition::Hostile);
        scene.aura(10, 1, 5, AuraDisposition::Enemy);
        scene.reconcile(&rules);
        assert_eq!(scene.grants().len(), 1);

        scene.effects[0].disabled = true;
        scene.reconcile(&rules);
        assert!(scene.grants().is_empty());

        scene.effects[0].disabled = false;
        scene.reconcile(&rules);
        scene.effects.retain(|effect| effect.id != EffectId(10));
        scene.reconcile(&rules);
        assert!(scene.grants().is_empty());
    }

    #[test]
    fn duplicate_grants_collapse_to_one() {
        let rules = RulesConfig::default();
        let mut scene = Scene::new();
        scene.token(1, 0, 0, Disposition::Friendly);
        scene.token(2, 1, 0, Disposition::Hostile);
        scene.aura(10, 1, 5, AuraDisposition::Enemy);
        for id in [50, 51] {
            let mut effect = NewEffect::new(ActorId(2), "Spirit Guardians").into_state(EffectId(id));
            effect.flags.aura_source = Some(EffectId(10));
            scene.effects.push(effect);
        }

        let delta = scene.reconcile(&rules);
        assert_eq!(delta.remove, [EffectId(51)]);
        assert!(delta.create.is_empty());
    }

    #[test]
    fn uniqueness_holds_across_random_moves_and_toggles() {
        let rules = RulesConfig::default();
        let mut scene = Scene::new();
        let dispositions = [Disposition::Friendly, Disposition::Hostile, Disposition::Neutral];
        for id in 1..=6 {
            scene.token(id, id as i32, 0, dispositions[id as usize % 3]);
        }
        scene.aura(10, 1, 10, AuraDisposition::Enemy);
        scene.aura(11, 2, 5, AuraDisposition::Ally);
        scene.aura(12, 3, 15, AuraDisposition::Creature);

        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for _ in 0..200 {
            match next() % 3 {
                0 | 1 => {
                    let index = next() % scene.tokens.len();
                    scene.tokens[index].position =
                        Position::new((next() % 12) as i32, (next() % 12) as i32);
                }
                _ => {
                    let index = next() % 3;
                    scene.effects[index].disabled = !scene.effects[index].disabled;
                }
            }
            scene.reconcile(&rules);

            let grants = scene.grants();
            let mut unique = grants.clone();
            unique.dedup();
            assert_eq!(grants, unique);
            assert!(plan_reconciliation(&scene.tokens, &scene.effects, &rules).is_empty());
        }
    }
}
