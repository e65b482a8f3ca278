//! Roll steps: attacks, saving throws and damage.

use std::ops::ControlFlow;

use async_trait::async_trait;
use skirmish_core::RolledDamage;

use super::{StepContext, StepExecutor, StepOutcome, roll_d20, roll_parts};
use crate::activation::{
    ActivationRecord, AttackResult, RollMode, SaveResult, StepOutput, Target, TargetDamage,
};
use crate::error::StepError;

/// d20 + attack bonus against each target's armour class.
///
/// A natural 20 always hits and is critical; a natural 1 always misses.
pub(super) struct AttackRoll;

#[async_trait]
impl StepExecutor for AttackRoll {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let mode = match cx.roll_mode(record)? {
            ControlFlow::Continue(mode) => mode,
            ControlFlow::Break(outcome) => return Ok(outcome),
        };

        let store = cx.session.store();
        let mut results = Vec::with_capacity(record.targets.len());
        for target in &record.targets {
            let Some(actor) = store.actor(target.actor)? else {
                tracing::warn!(
                    target: "runtime::steps",
                    actor = %target.actor,
                    "attack target no longer exists, skipping"
                );
                continue;
            };
            let natural = roll_d20(cx.session.dice(), mode);
            let total = natural + cx.item.attack_bonus;
            let critical = natural == 20;
            let hit = critical || (natural != 1 && total >= actor.armor_class);
            results.push(AttackResult {
                target: *target,
                natural,
                total,
                hit,
                critical,
            });
        }

        Ok(StepOutcome::output(StepOutput::Attacks(results)))
    }
}

/// Damage for every target the last attack hit. Criticals roll doubled dice.
pub(super) struct AttackDamageRoll;

#[async_trait]
impl StepExecutor for AttackDamageRoll {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let hits: Vec<(Target, bool)> = match record.attacks() {
            Some(attacks) => attacks
                .iter()
                .filter(|attack| attack.hit)
                .map(|attack| (attack.target, attack.critical))
                .collect(),
            None => record.targets.iter().map(|target| (*target, false)).collect(),
        };

        let dice = cx.session.dice();
        let parts = || cx.item.damage_parts(record.application);
        let mut normal: Option<Vec<RolledDamage>> = None;
        let mut critical: Option<Vec<RolledDamage>> = None;

        let mut damage = Vec::with_capacity(hits.len());
        for (target, is_critical) in hits {
            let slot = if is_critical { &mut critical } else { &mut normal };
            let rolls = match slot.as_ref() {
                Some(rolls) => rolls.clone(),
                None => {
                    let rolls = roll_parts(dice, parts(), is_critical)?;
                    *slot = Some(rolls.clone());
                    rolls
                }
            };
            damage.push(TargetDamage { target, rolls });
        }

        Ok(StepOutcome::output(StepOutput::Damage(damage)))
    }
}

/// Each target rolls d20 + its save bonus against the item's DC.
pub(super) struct SavingThrow;

#[async_trait]
impl StepExecutor for SavingThrow {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let Some(save) = &cx.item.save else {
            return Ok(StepOutcome::done());
        };

        let store = cx.session.store();
        let mut results = Vec::with_capacity(record.targets.len());
        for target in &record.targets {
            let Some(actor) = store.actor(target.actor)? else {
                continue;
            };
            let total = roll_d20(cx.session.dice(), RollMode::Normal) + actor.save_bonus(&save.ability);
            results.push(SaveResult {
                target: *target,
                total,
                success: total >= save.dc,
            });
        }

        Ok(StepOutcome::output(StepOutput::Saves(results)))
    }
}

/// One damage roll shared by all targets; a successful save halves the parts
/// marked for it and negates the rest.
///
/// Without a preceding saving throw every target takes the full roll.
pub(super) struct SaveDamageRoll;

#[async_trait]
impl StepExecutor for SaveDamageRoll {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let parts: Vec<_> = cx.item.damage_parts(record.application).collect();
        let rolls = roll_parts(cx.session.dice(), parts.iter().copied(), false)?;

        let damage = record
            .targets
            .iter()
            .map(|target| {
                let rolls = if record.saved(target) {
                    parts
                        .iter()
                        .zip(&rolls)
                        .filter(|(part, _)| part.halved_on_save)
                        .map(|(_, roll)| roll.halved())
                        .collect()
                } else {
                    rolls.clone()
                };
                TargetDamage {
                    target: *target,
                    rolls,
                }
            })
            .collect();

        Ok(StepOutcome::output(StepOutput::Damage(damage)))
    }
}
