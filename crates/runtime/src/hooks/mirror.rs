//! Hooks maintaining the linked views of an activation card.

use async_trait::async_trait;
use skirmish_core::{ActivationId, TemplateState};
use tracing::{debug, info};

use super::{HostEvent, HostHook, HookCriticality};
use crate::activation::ActivationState;
use crate::cards::ActivationCard;
use crate::error::Result;
use crate::repository::{DocumentStore, MessageFlags, MessageRecord, NewMessage, Visibility};
use crate::session::SessionContext;

/// Creates a privileged-only copy of every card a non-privileged user
/// originates, links it to the other views and refreshes them all.
#[derive(Debug, Clone, Copy)]
pub struct GmMirrorHook;

impl GmMirrorHook {
    fn wants_mirror(ctx: &SessionContext, message: &MessageRecord) -> bool {
        let flags = &message.flags;
        flags.originator.is_some_and(|user| user != ctx.gamemaster().id)
            && !flags.gm_view
            && flags.links.master == Some(message.id)
            && flags.links.gm.is_none()
    }
}

#[async_trait]
impl HostHook for GmMirrorHook {
    fn name(&self) -> &'static str {
        "gm_mirror"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Optional
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        matches!(event, HostEvent::MessageCreated { .. })
    }

    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>> {
        let HostEvent::MessageCreated { message } = event else {
            return Ok(Vec::new());
        };
        if !Self::wants_mirror(ctx, message) {
            return Ok(Vec::new());
        }

        let store = ctx.store();
        let gm = ctx.gamemaster();
        let mirror = store.create_message(
            NewMessage::new(gm.id, Visibility::GmOnly, message.content.clone()).with_flags(
                MessageFlags {
                    activation: message.flags.activation,
                    originator: None,
                    gm_view: true,
                    links: message.flags.links,
                    damage_card: None,
                },
            ),
        )?;

        let mut links = message.flags.links;
        links.gm = Some(mirror.id);
        for id in links.iter() {
            if let Some(mut linked) = store.message(id)? {
                linked.flags.links = links;
                store.save_message(&linked)?;
            }
        }

        if let Some(activation) = message.flags.activation
            && let Some(mut record) = store.activation(activation)?
        {
            record.messages = links;
            store.save_activation(&record)?;
            ActivationCard::refresh(ctx, &record)?;
        }
        debug!(target: "runtime::mirror", master = %message.id, mirror = %mirror.id, "privileged mirror created");
        Ok(Vec::new())
    }
}

/// Removes the other views of a deleted card, and tears down the activation
/// when its master view goes.
///
/// Teardown releases the activation's template (deleting it when no other
/// activation owns it) and cancels the activation if it is still live.
/// Effects it already created stay.
#[derive(Debug, Clone, Copy)]
pub struct LinkedRemovalHook;

#[async_trait]
impl HostHook for LinkedRemovalHook {
    fn name(&self) -> &'static str {
        "linked_removal"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        matches!(event, HostEvent::MessageDeleted { .. })
    }

    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>> {
        let HostEvent::MessageDeleted { message } = event else {
            return Ok(Vec::new());
        };
        let links = message.flags.links;
        ctx.removal()
            .enqueue(links.iter().filter(|id| *id != message.id))?;

        if links.master != Some(message.id) {
            return Ok(Vec::new());
        }
        let Some(activation) = message.flags.activation else {
            return Ok(Vec::new());
        };
        let deleted = tear_down_activation(ctx.store(), activation)?;
        Ok(deleted
            .map(|template| HostEvent::TemplateDeleted { template })
            .into_iter()
            .collect())
    }
}

/// Cancels `activation` after its master card went away.
///
/// Releases the activation's template, deleting it (and detaching it from its
/// token) when no other activation owns it. Returns the deleted template.
pub(crate) fn tear_down_activation(
    store: &dyn DocumentStore,
    activation: ActivationId,
) -> Result<Option<TemplateState>> {
    let Some(mut record) = store.activation(activation)? else {
        return Ok(None);
    };

    let mut deleted = None;
    if let Some(template) = record.template.take()
        && let Some(mut template) = store.template(template)?
    {
        if template.release(activation) {
            deleted = store.delete_template(template.id)?;
        } else {
            store.save_template(&template)?;
        }
    }
    if let Some(template) = &deleted
        && let Some(token) = template.attached_token
        && let Some(mut token) = store.token(token)?
        && token.attached_template == Some(template.id)
    {
        token.attached_template = None;
        store.save_token(&token)?;
    }

    if !record.is_terminal() {
        record.error = Some("card deleted".into());
        record.archive(ActivationState::Cancelled);
        info!(target: "runtime::mirror", activation = %activation, "activation cancelled with its card");
    }
    store.save_activation(&record)?;
    Ok(deleted)
}
