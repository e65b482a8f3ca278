//! Effect steps: concentration, the master duration effect, applying the
//! item's effects and ending the effect that triggered an activation.

use async_trait::async_trait;
use skirmish_core::{ActorId, AuraTag, EffectFlags, EffectId, EffectState, NewEffect};
use tracing::warn;

use super::{StepContext, StepExecutor, StepOutcome};
use crate::activation::{ActivationRecord, StepOutput, Target};
use crate::error::StepError;
use crate::hooks::HostEvent;

fn base_effect(cx: &StepContext<'_>, actor: ActorId, label: impl Into<String>) -> NewEffect {
    NewEffect::new(actor, label)
        .with_origin(cx.item.id)
        .with_duration(cx.item.duration)
}

/// Adds `effect` to the caster's turn-updated list.
fn track_on_caster(cx: &StepContext<'_>, caster: ActorId, effect: EffectId) -> Result<(), StepError> {
    let store = cx.session.store();
    let Some(mut actor) = store.actor(caster)? else {
        return Ok(());
    };
    if !actor.turn_updated_effects.contains(&effect) {
        actor.turn_updated_effects.push(effect);
        store.save_actor(&actor)?;
    }
    Ok(())
}

/// Marks the caster as concentrating on the item.
pub(super) struct Concentration;

#[async_trait]
impl StepExecutor for Concentration {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let effect = base_effect(&cx, record.actor, format!("Concentrating: {}", cx.item.name))
            .with_flags(EffectFlags {
                concentration: true,
                activation: Some(record.id),
                ..EffectFlags::default()
            });
        let effect = cx.session.store().create_effect(effect)?;
        Ok(StepOutcome::output(StepOutput::Effects(vec![effect.id])))
    }
}

/// Creates the master effect on the caster. It owns the activation's template
/// and child effects, and carries the item's own conditions.
pub(super) struct DurationEffect;

#[async_trait]
impl StepExecutor for DurationEffect {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let effect = base_effect(&cx, record.actor, cx.item.name.clone()).with_flags(EffectFlags {
            is_master: true,
            template: record.template,
            casting_actor: Some(record.actor),
            activation: Some(record.id),
            application: Some(record.application),
            conditions: cx.item.conditions.clone(),
            ..EffectFlags::default()
        });
        let effect = cx.session.store().create_effect(effect)?;
        record.master_effect = Some(effect.id);
        if !effect.flags.conditions.is_empty() {
            track_on_caster(&cx, record.actor, effect.id)?;
        }
        Ok(StepOutcome::output(StepOutput::Effects(vec![effect.id])))
    }
}

/// Creates the item's effects for this phase on every target.
///
/// Targets that succeeded on the latest save are spared saveable effects.
pub(super) struct ApplyEffects;

impl ApplyEffects {
    fn create_for(
        cx: &StepContext<'_>,
        record: &ActivationRecord,
        target: &Target,
    ) -> Result<Vec<EffectState>, StepError> {
        let store = cx.session.store();
        let mut created = Vec::new();
        for template in cx.item.effect_templates(record.application) {
            if template.saveable && record.saved(target) {
                continue;
            }
            let effect = base_effect(cx, target.actor, template.label.clone()).with_flags(EffectFlags {
                casting_actor: Some(record.actor),
                activation: Some(record.id),
                application: Some(record.application),
                conditions: template.conditions.clone(),
                aura: template.aura.map(|disposition| AuraTag {
                    range: cx.item.target.value.unwrap_or(0),
                    disposition,
                }),
                ..EffectFlags::default()
            });
            match store.create_effect(effect) {
                Ok(effect) => created.push(effect),
                Err(error) if error.is_missing() => {
                    warn!(
                        target: "runtime::steps",
                        actor = %target.actor,
                        "effect target vanished, skipping"
                    );
                    break;
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(created)
    }
}

#[async_trait]
impl StepExecutor for ApplyEffects {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let mut created = Vec::new();
        for target in &record.targets {
            created.extend(Self::create_for(&cx, record, target)?);
        }

        for effect in created.iter().filter(|effect| !effect.flags.conditions.is_empty()) {
            track_on_caster(&cx, record.actor, effect.id)?;
        }

        let store = cx.session.store();
        if let Some(master) = record.master_effect
            && let Some(mut master) = store.effect(master)?
        {
            master
                .flags
                .child_effects
                .extend(created.iter().map(|effect| effect.id));
            store.save_effect(&master)?;
        }

        let ids = created.iter().map(|effect| effect.id).collect();
        for effect in created {
            cx.session
                .dispatch(HostEvent::EffectCreated { effect })
                .await?;
        }
        Ok(StepOutcome::output(StepOutput::Effects(ids)))
    }
}

/// Deletes the effect whose condition started the activation.
pub(super) struct EndEffect;

#[async_trait]
impl StepExecutor for EndEffect {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let ended = match record.source_effect {
            Some(id) => end(&cx, id).await?,
            None => Vec::new(),
        };
        Ok(StepOutcome::output(StepOutput::Ended(ended)))
    }
}

/// Deletes the triggering effect when its bearer made the latest save.
pub(super) struct EndEffectOnSave;

#[async_trait]
impl StepExecutor for EndEffectOnSave {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let Some(id) = record.source_effect else {
            return Ok(StepOutcome::output(StepOutput::Ended(Vec::new())));
        };
        let Some(effect) = cx.session.store().effect(id)? else {
            return Ok(StepOutcome::output(StepOutput::Ended(Vec::new())));
        };

        let ended = if record.saved(&Target::new(effect.actor, None)) {
            end(&cx, id).await?
        } else {
            Vec::new()
        };
        Ok(StepOutcome::output(StepOutput::Ended(ended)))
    }
}

async fn end(cx: &StepContext<'_>, id: EffectId) -> Result<Vec<EffectId>, StepError> {
    match cx.session.store().delete_effect(id)? {
        Some(effect) => {
            cx.session
                .dispatch(HostEvent::EffectDeleted { effect })
                .await?;
            Ok(vec![id])
        }
        None => Ok(Vec::new()),
    }
}
