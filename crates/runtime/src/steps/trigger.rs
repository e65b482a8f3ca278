//! Attack-related condition events.

use async_trait::async_trait;
use skirmish_core::ActorId;
use skirmish_core::trigger::events;

use super::{StepContext, StepExecutor, StepOutcome};
use crate::activation::{ActivationRecord, StepOutput};
use crate::error::StepError;
use crate::events::ActivationEvent;

/// Fires the attacker's and every target's attack events.
///
/// Event names carry the attack kind (`target-hits.rwak`); conditions
/// configured for `.all` match any kind.
pub(super) struct TriggerAction;

impl TriggerAction {
    fn fired(record: &ActivationRecord, kind: &str) -> Vec<(ActorId, String)> {
        let attacks = record.attacks().map(Vec::as_slice).unwrap_or_default();
        let mut fired = vec![(record.actor, format!("{}.{kind}", events::TARGET_ATTACKS))];
        if attacks.iter().any(|attack| attack.hit) {
            fired.push((record.actor, format!("{}.{kind}", events::TARGET_HITS)));
        }
        for attack in attacks {
            fired.push((
                attack.target.actor,
                format!("{}.{kind}", events::TARGET_IS_ATTACKED),
            ));
            if attack.hit {
                fired.push((attack.target.actor, format!("{}.{kind}", events::TARGET_IS_HIT)));
            }
        }
        fired
    }
}

#[async_trait]
impl StepExecutor for TriggerAction {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let Some(kind) = cx.item.action_type.filter(|kind| kind.is_attack()) else {
            return Ok(StepOutcome::output(StepOutput::Triggered(Vec::new())));
        };
        let kind: &'static str = kind.into();

        let fired = Self::fired(record, kind);
        for (actor, event) in &fired {
            cx.session
                .fire_condition(*actor, event, Some(record.id))
                .await?;
        }

        Ok(StepOutcome::output(StepOutput::Triggered(
            fired.into_iter().map(|(_, event)| event).collect(),
        )))
    }
}

/// Reports how the attack went.
pub(super) struct AttackCompleted;

#[async_trait]
impl StepExecutor for AttackCompleted {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let attacks = record.attacks().map(Vec::as_slice).unwrap_or_default();
        let hits = attacks.iter().filter(|attack| attack.hit).count();
        cx.session.bus().publish(ActivationEvent::AttackCompleted {
            activation: record.id,
            hits,
            misses: attacks.len() - hits,
        });
        Ok(StepOutcome::done())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use skirmish_core::{
        ActivationId, ApplicationType, DefaultFlow, ItemId, Plan, PreRollOptions, User, UserId,
    };

    use super::*;
    use crate::activation::{ActivationState, AttackResult, Target};
    use crate::repository::MessageLinks;

    fn attack(actor: u64, hit: bool) -> AttackResult {
        AttackResult {
            target: Target::new(ActorId(actor), None),
            natural: if hit { 15 } else { 2 },
            total: if hit { 20 } else { 7 },
            hit,
            critical: false,
        }
    }

    #[test]
    fn hits_fire_on_both_sides() {
        let mut outputs = BTreeMap::new();
        outputs.insert(0, StepOutput::Attacks(vec![attack(2, true), attack(3, false)]));
        let record = ActivationRecord {
            id: ActivationId(1),
            actor: ActorId(1),
            item: ItemId(1),
            user: User::player(UserId(1)),
            application: ApplicationType::Immediate,
            flow: DefaultFlow::ItemRoll,
            source_effect: None,
            plan: Plan::default(),
            fingerprint: [0; 32],
            pre_roll: PreRollOptions::default(),
            targets: Vec::new(),
            cursor: 1,
            state: ActivationState::Running,
            outputs,
            pending_input: None,
            messages: MessageLinks::default(),
            template: None,
            master_effect: None,
            error: None,
            created_at: Utc::now(),
            archived_at: None,
        };

        let fired = TriggerAction::fired(&record, "rwak");
        assert_eq!(
            fired,
            vec![
                (ActorId(1), "target-attacks.rwak".to_string()),
                (ActorId(1), "target-hits.rwak".to_string()),
                (ActorId(2), "target-is-attacked.rwak".to_string()),
                (ActorId(2), "target-is-hit.rwak".to_string()),
                (ActorId(3), "target-is-attacked.rwak".to_string()),
            ]
        );
    }
}
