use async_trait::async_trait;
use skirmish_core::points_against;

use super::{StepContext, StepExecutor, StepOutcome};
use crate::activation::{ActivationRecord, StepOutput};
use crate::cards::{DamageCard, DamageCardRequest};
use crate::error::StepError;

/// Turns the latest damage rolls into one damage card per target.
pub(super) struct ApplyDamage;

#[async_trait]
impl StepExecutor for ApplyDamage {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let damage = record
            .damage()
            .cloned()
            .ok_or(StepError::MissingOutput("damage rolls"))?;

        let store = cx.session.store();
        let mut cards = Vec::with_capacity(damage.len());
        for entry in damage.iter().filter(|entry| !entry.rolls.is_empty()) {
            let Some(actor) = store.actor(entry.target.actor)? else {
                continue;
            };
            let request = DamageCardRequest {
                source: Some(record.actor),
                target: actor.id,
                token: entry.target.token,
                points: points_against(&entry.rolls, &actor.traits),
                activation: Some(record.id),
            };
            if let Some(card) = DamageCard::make(cx.session, cx.user, request).await? {
                cards.push(card);
            }
        }

        Ok(StepOutcome::output(StepOutput::Cards(cards)))
    }
}
