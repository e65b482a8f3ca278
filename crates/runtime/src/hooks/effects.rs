//! Hook cascading effect deletions.

use async_trait::async_trait;
use skirmish_core::{EffectState, MissingReferenceError, RecordRef};
use tracing::{debug, warn};

use super::{HostEvent, HostHook};
use crate::error::Result;
use crate::session::SessionContext;

/// Cleans up after a deleted effect.
///
/// - A master effect releases its template and deletes its child effects.
/// - An effect tracked on its caster is removed from the caster's list.
/// - Ending concentration deletes the activation's master effect.
#[derive(Debug, Clone, Copy)]
pub struct EffectLifecycleHook;

impl EffectLifecycleHook {
    fn release_template(ctx: &SessionContext, effect: &EffectState) -> Result<Option<HostEvent>> {
        let (Some(template), Some(activation)) = (effect.flags.template, effect.flags.activation) else {
            return Ok(None);
        };
        let store = ctx.store();
        let Some(mut template) = store.template(template)? else {
            return Ok(None);
        };
        if !template.release(activation) {
            store.save_template(&template)?;
            return Ok(None);
        }
        Ok(store
            .delete_template(template.id)?
            .map(|template| HostEvent::TemplateDeleted { template }))
    }

    fn untrack(ctx: &SessionContext, effect: &EffectState) -> Result<()> {
        let Some(caster) = effect.flags.casting_actor else {
            return Ok(());
        };
        let store = ctx.store();
        let Some(mut actor) = store.actor(caster)? else {
            let missing = MissingReferenceError(RecordRef::Actor(caster));
            warn!(target: "runtime::hooks", effect = %effect.id, error = %missing, "casting actor gone, skipping cleanup");
            return Ok(());
        };
        let before = actor.turn_updated_effects.len();
        actor.turn_updated_effects.retain(|id| *id != effect.id);
        if actor.turn_updated_effects.len() != before {
            store.save_actor(&actor)?;
        }
        Ok(())
    }
}

#[async_trait]
impl HostHook for EffectLifecycleHook {
    fn name(&self) -> &'static str {
        "effect_lifecycle"
    }

    fn priority(&self) -> i32 {
        -20
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        matches!(event, HostEvent::EffectDeleted { .. })
    }

    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>> {
        let HostEvent::EffectDeleted { effect } = event else {
            return Ok(Vec::new());
        };
        let store = ctx.store();
        let mut follow_ups = Vec::new();

        if effect.flags.is_master {
            follow_ups.extend(Self::release_template(ctx, effect)?);
            for child in &effect.flags.child_effects {
                if let Some(child) = store.delete_effect(*child)? {
                    follow_ups.push(HostEvent::EffectDeleted { effect: child });
                }
            }
        }

        Self::untrack(ctx, effect)?;

        if effect.flags.concentration
            && let Some(activation) = effect.flags.activation
            && let Some(record) = store.activation(activation)?
            && let Some(master) = record.master_effect
            && let Some(master) = store.delete_effect(master)?
        {
            debug!(target: "runtime::hooks", activation = %activation, "concentration ended");
            follow_ups.push(HostEvent::EffectDeleted { effect: master });
        }

        Ok(follow_ups)
    }
}
