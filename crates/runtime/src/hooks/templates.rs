//! Hook keeping attached templates in step with their tokens.

use async_trait::async_trait;
use skirmish_core::Position;
use tracing::debug;

use super::{HostEvent, HostHook};
use crate::error::Result;
use crate::session::SessionContext;

/// Moves a template with the token it is attached to (when the mover placed
/// it), deletes it with the token, and clears the token's attachment when the
/// template goes first.
#[derive(Debug, Clone, Copy)]
pub struct TemplateHook;

#[async_trait]
impl HostHook for TemplateHook {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn should_trigger(&self, event: &HostEvent) -> bool {
        matches!(
            event,
            HostEvent::TokenMoved { .. }
                | HostEvent::TokenDeleted { .. }
                | HostEvent::TemplateDeleted { .. }
        )
    }

    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>> {
        let store = ctx.store();
        match event {
            HostEvent::TokenMoved {
                token,
                user,
                from,
                to,
            } => {
                let Some(token) = store.token(*token)? else {
                    return Ok(Vec::new());
                };
                if let Some(template) = token.attached_template
                    && let Some(mut template) = store.template(template)?
                    && template.author == *user
                {
                    template.origin = Position::new(
                        template.origin.x + (to.x - from.x),
                        template.origin.y + (to.y - from.y),
                    );
                    store.save_template(&template)?;
                    debug!(target: "runtime::hooks", template = %template.id, "template followed its token");
                }
                Ok(Vec::new())
            }
            HostEvent::TokenDeleted { token } => Ok(match token.attached_template {
                Some(template) => store
                    .delete_template(template)?
                    .map(|template| HostEvent::TemplateDeleted { template })
                    .into_iter()
                    .collect(),
                None => Vec::new(),
            }),
            HostEvent::TemplateDeleted { template } => {
                if let Some(token) = template.attached_token
                    && let Some(mut token) = store.token(token)?
                    && token.attached_template == Some(template.id)
                {
                    token.attached_template = None;
                    store.save_token(&token)?;
                }
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }
}
