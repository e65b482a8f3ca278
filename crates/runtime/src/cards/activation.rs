//! Activation cards: the master message, its public mirror, and re-rendering
//! both as the activation progresses.

use serde_json::{Value, json};
use skirmish_core::MessageId;

use crate::activation::ActivationRecord;
use crate::error::Result;
use crate::repository::{MessageFlags, MessageLinks, MessageRecord, NewMessage, Visibility};
use crate::session::SessionContext;

/// Who a rendered view is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The acting user and privileged observers.
    Full,
    /// Everyone else: progress only, no roll details.
    Public,
}

pub struct ActivationCard;

impl ActivationCard {
    /// Renders the card for `audience`.
    pub fn render(record: &ActivationRecord, item_name: &str, audience: Audience) -> Value {
        let steps: Vec<Value> = record
            .plan
            .iter()
            .enumerate()
            .map(|(index, step)| {
                json!({
                    "name": step.name.as_str(),
                    "done": index < record.cursor,
                })
            })
            .collect();

        let mut card = json!({
            "activation": record.id.0,
            "item": item_name,
            "state": record.state,
            "steps": steps,
            "targets": record.targets.len(),
        });
        if audience == Audience::Full {
            card["outputs"] = serde_json::to_value(&record.outputs).unwrap_or(Value::Null);
            card["pending"] = serde_json::to_value(&record.pending_input).unwrap_or(Value::Null);
            card["error"] = json!(record.error);
        }
        card
    }

    /// Creates the master message and its public mirror, linking both.
    ///
    /// Returns the links and the master message as stored.
    pub fn publish(ctx: &SessionContext, record: &ActivationRecord) -> Result<(MessageLinks, MessageRecord)> {
        let store = ctx.store();
        let item_name = store
            .item(record.item)?
            .map(|item| item.name)
            .unwrap_or_default();

        let flags = MessageFlags {
            activation: Some(record.id),
            originator: Some(record.user.id),
            ..MessageFlags::default()
        };
        let mut master = store.create_message(
            NewMessage::new(
                record.user.id,
                Visibility::Whisper,
                Self::render(record, &item_name, Audience::Full),
            )
            .with_flags(flags.clone()),
        )?;
        let mut player = store.create_message(
            NewMessage::new(
                record.user.id,
                Visibility::Public,
                Self::render(record, &item_name, Audience::Public),
            )
            .with_flags(MessageFlags {
                originator: None,
                ..flags
            }),
        )?;

        let links = MessageLinks {
            master: Some(master.id),
            gm: None,
            player: Some(player.id),
        };
        master.flags.links = links;
        player.flags.links = links;
        store.save_message(&master)?;
        store.save_message(&player)?;
        Ok((links, master))
    }

    /// Re-renders every linked view of the activation. Views deleted in the
    /// meantime are skipped.
    pub fn refresh(ctx: &SessionContext, record: &ActivationRecord) -> Result<()> {
        let store = ctx.store();
        let item_name = store
            .item(record.item)?
            .map(|item| item.name)
            .unwrap_or_default();

        let views = [
            (record.messages.master, Audience::Full),
            (record.messages.gm, Audience::Full),
            (record.messages.player, Audience::Public),
        ];
        for (id, audience) in views {
            let Some(id) = id else { continue };
            Self::rewrite(ctx, id, Self::render(record, &item_name, audience))?;
        }
        Ok(())
    }

    fn rewrite(ctx: &SessionContext, id: MessageId, content: Value) -> Result<()> {
        let store = ctx.store();
        let Some(mut message) = store.message(id)? else {
            return Ok(());
        };
        message.content = content;
        match store.save_message(&message) {
            Err(error) if !error.is_missing() => Err(error.into()),
            _ => Ok(()),
        }
    }
}
