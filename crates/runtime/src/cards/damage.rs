//! Damage cards: per-target HP records with apply and undo controls.

use serde::{Deserialize, Serialize};
use serde_json::json;
use skirmish_core::{
    ActivationId, ActorId, DamagePoints, MessageId, TokenId, User, compute_damage_entry,
};
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::DamageEvent;
use crate::repository::{DamageCardState, MessageFlags, NewMessage, Visibility};
use crate::session::SessionContext;

/// Everything needed to render a damage card for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageCardRequest {
    /// Actor that caused the damage, if any.
    pub source: Option<ActorId>,
    pub target: ActorId,
    pub token: Option<TokenId>,
    pub points: DamagePoints,
    pub activation: Option<ActivationId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Apply,
    Undo,
}

pub struct DamageCard;

impl DamageCard {
    /// Card for a flat amount of damage (negative amounts heal).
    pub async fn make_for_actor(
        ctx: &SessionContext,
        user: User,
        source: Option<ActorId>,
        target: ActorId,
        amount: i32,
    ) -> Result<Option<MessageId>> {
        let points = if amount < 0 {
            DamagePoints::healing(-amount)
        } else {
            DamagePoints::damage(amount)
        };
        let token = ctx.store().token_of(target)?.map(|token| token.id);
        let request = DamageCardRequest {
            source,
            target,
            token,
            points,
            activation: None,
        };
        Self::make(ctx, user, request).await
    }

    /// Creates the card, relaying through the privileged user when the target
    /// is not player-owned and `user` lacks privilege.
    ///
    /// Returns `None` when the target no longer exists.
    pub async fn make(
        ctx: &SessionContext,
        user: User,
        request: DamageCardRequest,
    ) -> Result<Option<MessageId>> {
        let Some(actor) = ctx.store().actor(request.target)? else {
            debug!(target: "runtime::cards", actor = %request.target, "damage target gone, no card");
            return Ok(None);
        };
        if !actor.player_owned && !user.is_privileged() {
            return ctx.relay().create_damage_card(request).await;
        }
        Self::create(ctx, user, request)
    }

    /// Writes the card as `user` without any relay decision.
    pub(crate) fn create(
        ctx: &SessionContext,
        user: User,
        request: DamageCardRequest,
    ) -> Result<Option<MessageId>> {
        let store = ctx.store();
        let Some(actor) = store.actor(request.target)? else {
            return Ok(None);
        };

        let entry = compute_damage_entry(&actor.hp, &request.points);
        let visibility = if actor.player_owned {
            Visibility::Public
        } else {
            Visibility::Whisper
        };
        let content = json!({
            "actor": actor.name,
            "gm": !actor.player_owned,
            "entry": entry,
        });
        let flags = MessageFlags {
            activation: request.activation,
            damage_card: Some(DamageCardState {
                actor: actor.id,
                token: request.token,
                points: request.points,
                entry,
                applied: false,
            }),
            ..MessageFlags::default()
        };

        let message = store.create_message(NewMessage::new(user.id, visibility, content).with_flags(flags))?;
        debug!(
            target: "runtime::cards",
            card = %message.id,
            actor = %actor.id,
            hp_dmg = entry.hp_dmg,
            "damage card created"
        );
        Ok(Some(message.id))
    }

    /// Writes the card's "after" HP. Returns `false` without touching anything
    /// when `user` may not modify the target or the card was already applied.
    pub fn apply(ctx: &SessionContext, user: User, card: MessageId) -> Result<bool> {
        Self::write(ctx, user, card, Direction::Apply)
    }

    /// Writes the card's "before" HP back.
    pub fn undo(ctx: &SessionContext, user: User, card: MessageId) -> Result<bool> {
        Self::write(ctx, user, card, Direction::Undo)
    }

    fn write(ctx: &SessionContext, user: User, card: MessageId, direction: Direction) -> Result<bool> {
        let store = ctx.store();
        let Some(mut message) = store.message(card)? else {
            return Ok(false);
        };
        let Some(mut state) = message.flags.damage_card else {
            return Ok(false);
        };
        if state.applied == (direction == Direction::Apply) {
            return Ok(false);
        }
        let Some(mut actor) = store.actor(state.actor)? else {
            return Ok(false);
        };
        if let Err(denied) = user.authorize(&actor) {
            warn!(target: "runtime::cards", card = %card, error = %denied, "damage card control ignored");
            return Ok(false);
        }

        let change = match direction {
            Direction::Apply => state.entry.applied(),
            Direction::Undo => state.entry.undone(),
        };
        change.write_to(&mut actor.hp);
        store.save_actor(&actor)?;

        state.applied = direction == Direction::Apply;
        message.flags.damage_card = Some(state);
        store.save_message(&message)?;

        let event = match direction {
            Direction::Apply => DamageEvent::Applied {
                card,
                actor: actor.id,
                dhp: change.dhp,
                entry: state.entry,
            },
            Direction::Undo => DamageEvent::Undone {
                card,
                actor: actor.id,
                dhp: change.dhp,
                entry: state.entry,
            },
        };
        ctx.bus().publish(event);
        Ok(true)
    }
}
