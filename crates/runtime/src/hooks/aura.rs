//! Hook driving the aura reconciler.

use async_trait::async_trait;
use skirmish_core::EffectState;

use super::{HookCriticality, HostEvent, HostHook};
use crate::error::Result;
use crate::session::SessionContext;

/// Reconciles auras after token movement, token deletion, or any change to
/// an aura source effect, then reports `*-enters-area` for every new grant.
#[derive(Debug, Clone, Copy)]
pub struct AuraHook;

#[async_trait]
impl HostHook for AuraHook {
    fn name(&self) -> &'static str {
        "aura"
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        match event {
            HostEvent::TokenMoved { .. }
            | HostEvent::TokenDeleted { .. }
            | HostEvent::EffectToggled { .. } => true,
            HostEvent::EffectCreated { effect } | HostEvent::EffectDeleted { effect } => {
                effect.flags.aura.is_some()
            }
            _ => false,
        }
    }

    async fn handle(&self, ctx: &SessionContext, _event: &HostEvent) -> Result<Vec<HostEvent>> {
        let outcome = ctx.auras().reconcile(ctx).await?;

        let mut follow_ups = Vec::new();
        for effect in &outcome.created {
            let Some(source) = effect.flags.aura_source else {
                continue;
            };
            let Some(source) = ctx.store().effect(source)? else {
                continue;
            };
            follow_ups.extend(area_events(ctx, &source, effect, "enters-area")?);
        }
        follow_ups.extend(
            outcome
                .removed
                .into_iter()
                .map(|effect| HostEvent::EffectDeleted { effect }),
        );
        Ok(follow_ups)
    }
}

/// Area condition events for `bearer`, which carries a grant of `source`.
///
/// Emits `creature-<phase>` plus `ally-<phase>` or `enemy-<phase>` depending
/// on how the bearer's token stands towards the source's token. Only events
/// the source actually listens to are returned.
pub(super) fn area_events(
    ctx: &SessionContext,
    source: &EffectState,
    bearer: &EffectState,
    phase: &str,
) -> Result<Vec<HostEvent>> {
    let store = ctx.store();
    let mut names = vec![format!("creature-{phase}")];
    if let Some(source_token) = store.token_of(source.actor)?
        && let Some(bearer_token) = store.token_of(bearer.actor)?
    {
        if bearer_token.disposition.is_ally_of(source_token.disposition) {
            names.push(format!("ally-{phase}"));
        } else if bearer_token.disposition.is_enemy_of(source_token.disposition) {
            names.push(format!("enemy-{phase}"));
        }
    }

    Ok(names
        .into_iter()
        .filter(|event| ctx.listens(source, event))
        .map(|event| HostEvent::ConditionFired {
            listener: source.id,
            bearer: bearer.id,
            event,
        })
        .collect())
}
