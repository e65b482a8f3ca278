//! Turn-driven condition events.

use async_trait::async_trait;
use skirmish_core::ActorId;
use skirmish_core::trigger::events;
use tokio::sync::Mutex;
use tracing::trace;

use super::aura::area_events;
use super::{HostEvent, HostHook};
use crate::error::Result;
use crate::session::SessionContext;

/// Last turn the session reacted to.
///
/// Hosts may report the same turn more than once (every client sees the
/// update); only the first report of a `(round, turn)` pair counts.
#[derive(Debug, Default)]
pub struct TurnTracker {
    last: Mutex<Option<(u32, u32)>>,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `(round, turn)` and reports whether it differs from the last one.
    pub async fn observe(&self, round: u32, turn: u32) -> bool {
        let mut last = self.last.lock().await;
        if *last == Some((round, turn)) {
            return false;
        }
        *last = Some((round, turn));
        true
    }

    pub async fn last(&self) -> Option<(u32, u32)> {
        *self.last.lock().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

impl Edge {
    fn caster(self) -> &'static str {
        match self {
            Edge::Start => events::START_OF_TURN_CASTER,
            Edge::End => events::END_OF_TURN_CASTER,
        }
    }

    fn target(self) -> &'static str {
        match self {
            Edge::Start => events::START_OF_TURN_TARGET,
            Edge::End => events::END_OF_TURN_TARGET,
        }
    }

    fn area(self) -> &'static str {
        match self {
            Edge::Start => "starts-turn-inside-area",
            Edge::End => "ends-turn-inside-area",
        }
    }
}

/// Fires end-of-turn conditions for the actor whose turn ended, then
/// start-of-turn conditions for the actor whose turn begins.
///
/// An actor inside an aura answers to the source's conditions: its
/// `*-of-turn-target` and `*-turn-inside-area` events fire with the source
/// as listener and the derived effect as bearer.
#[derive(Debug, Clone, Copy)]
pub struct TurnHook;

impl TurnHook {
    fn fired(ctx: &SessionContext, actor: ActorId, edge: Edge) -> Result<Vec<HostEvent>> {
        let store = ctx.store();
        let mut fired = Vec::new();

        if let Some(caster) = store.actor(actor)? {
            for id in &caster.turn_updated_effects {
                let Some(effect) = store.effect(*id)? else {
                    continue;
                };
                if ctx.listens(&effect, edge.caster()) {
                    fired.push(HostEvent::ConditionFired {
                        listener: effect.id,
                        bearer: effect.id,
                        event: edge.caster().to_string(),
                    });
                }
            }
        }

        for effect in store.effects_on(actor)? {
            if !effect.is_enabled() {
                continue;
            }
            match effect.flags.aura_source {
                Some(source) => {
                    let Some(source) = store.effect(source)? else {
                        continue;
                    };
                    if ctx.listens(&source, edge.target()) {
                        fired.push(HostEvent::ConditionFired {
                            listener: source.id,
                            bearer: effect.id,
                            event: edge.target().to_string(),
                        });
                    }
                    fired.extend(area_events(ctx, &source, &effect, edge.area())?);
                }
                // Aura sources answer through their grants.
                None if effect.flags.aura.is_some() => {}
                None if ctx.listens(&effect, edge.target()) => {
                    fired.push(HostEvent::ConditionFired {
                        listener: effect.id,
                        bearer: effect.id,
                        event: edge.target().to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(fired)
    }
}

#[async_trait]
impl HostHook for TurnHook {
    fn name(&self) -> &'static str {
        "turns"
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        matches!(event, HostEvent::TurnChanged { .. })
    }

    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>> {
        let HostEvent::TurnChanged {
            round,
            turn,
            previous,
            current,
        } = event
        else {
            return Ok(Vec::new());
        };
        if !ctx.turns().observe(*round, *turn).await {
            trace!(target: "runtime::hooks", round, turn, "turn already handled");
            return Ok(Vec::new());
        }

        let mut fired = Vec::new();
        if let Some(previous) = previous {
            fired.extend(Self::fired(ctx, *previous, Edge::End)?);
        }
        fired.extend(Self::fired(ctx, *current, Edge::Start)?);
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_turn_reports_are_ignored() {
        let tracker = TurnTracker::new();
        assert!(tracker.observe(1, 0).await);
        assert!(!tracker.observe(1, 0).await);
        assert!(tracker.observe(1, 1).await);
        assert!(tracker.observe(1, 0).await);
        assert_eq!(tracker.last().await, Some((1, 0)));
    }
}
