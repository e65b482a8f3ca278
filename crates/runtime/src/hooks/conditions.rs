//! Hook turning fired condition events into activations.

use async_trait::async_trait;
use skirmish_core::trigger::updates_for;
use skirmish_core::{DefaultFlow, RecordRef};
use tracing::{debug, info};

use super::{HostEvent, HostHook};
use crate::activation::{ActivationRequest, ActivationRunner};
use crate::error::Result;
use crate::repository::RepositoryError;
use crate::session::SessionContext;

/// Runs the update action of every condition on the listener that matches a
/// fired event.
///
/// The activation runs as the privileged user on behalf of the effect's
/// caster, with the bearer as its source effect, so effect-scoped flows act
/// on whoever carries the effect.
#[derive(Debug, Clone, Copy)]
pub struct ConditionHook;

#[async_trait]
impl HostHook for ConditionHook {
    fn name(&self) -> &'static str {
        "conditions"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        matches!(event, HostEvent::ConditionFired { .. })
    }

    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>> {
        let HostEvent::ConditionFired {
            listener,
            bearer,
            event,
        } = event
        else {
            return Ok(Vec::new());
        };

        let store = ctx.store();
        let Some(listener) = store.effect(*listener)? else {
            return Err(RepositoryError::missing(RecordRef::Effect(*listener)).into());
        };
        let Some(bearer) = store.effect(*bearer)? else {
            return Err(RepositoryError::missing(RecordRef::Effect(*bearer)).into());
        };
        let Some(item) = listener.origin else {
            debug!(target: "runtime::hooks", effect = %listener.id, "condition on an effect without an origin item");
            return Ok(Vec::new());
        };

        let actor = bearer
            .flags
            .casting_actor
            .or(listener.flags.casting_actor)
            .unwrap_or(listener.actor);
        let updates: Vec<_> = updates_for(&listener.flags.conditions, ctx.matrix(), event).collect();

        let runner = ActivationRunner::new(ctx);
        for update in updates {
            let (flow, application) = DefaultFlow::for_update(update);
            info!(
                target: "runtime::hooks",
                event = %event,
                update = %update,
                effect = %bearer.id,
                "condition fired"
            );
            let request = ActivationRequest::new(actor, item, ctx.gamemaster())
                .with_flow(flow, application)
                .with_source_effect(bearer.id);
            let record = runner.create(request).await?;
            runner.run(record.id).await?;

            // An earlier update may have ended the effect.
            if store.effect(bearer.id)?.is_none() {
                break;
            }
        }
        Ok(Vec::new())
    }
}
