//! Targeting steps: who an activation affects.

use async_trait::async_trait;
use skirmish_core::{
    ActorId, Position, RecordRef, StepArg, TargetShape, TemplateState, TokenId, TokenState,
};

use super::{StepContext, StepExecutor, StepOutcome};
use crate::activation::{ActivationRecord, InputRequest, InputResponse, StepOutput, Target};
use crate::error::StepError;
use crate::repository::{NewTemplate, RepositoryError};

fn targets_of(cx: &StepContext<'_>, tokens: &[TokenId]) -> Result<Vec<TokenState>, StepError> {
    let store = cx.session.store();
    let mut resolved = Vec::with_capacity(tokens.len());
    for id in tokens {
        if let Some(token) = store.token(*id)? {
            resolved.push(token);
        }
    }
    Ok(resolved)
}

fn as_targets(tokens: &[TokenState]) -> Vec<Target> {
    tokens
        .iter()
        .map(|token| Target::new(token.actor, Some(token.id)))
        .collect()
}

fn settle(record: &mut ActivationRecord, targets: Vec<Target>) -> StepOutcome {
    record.targets = targets.clone();
    StepOutcome::output(StepOutput::Targets(targets))
}

/// Actor carrying the effect that started the activation, or the acting actor.
fn effective_actor(cx: &StepContext<'_>, record: &ActivationRecord) -> Result<ActorId, StepError> {
    match record.source_effect {
        Some(id) => cx
            .session
            .store()
            .effect(id)?
            .map(|effect| effect.actor)
            .ok_or_else(|| RepositoryError::missing(RecordRef::Effect(id)).into()),
        None => Ok(record.actor),
    }
}

/// The acting user's current targets. Cancels when there are none.
pub(super) struct DefaultTargets;

#[async_trait]
impl StepExecutor for DefaultTargets {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let tokens = cx.session.spatial().targeted_tokens(record.user.id)?;
        let tokens = targets_of(&cx, &tokens)?;
        if tokens.is_empty() {
            return Ok(StepOutcome::Cancel("no targets selected".into()));
        }
        Ok(settle(record, as_targets(&tokens)))
    }
}

/// The effect bearer (or the acting actor itself) as the only target.
pub(super) struct EffectiveTargets;

#[async_trait]
impl StepExecutor for EffectiveTargets {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let actor = effective_actor(&cx, record)?;
        let token = cx.session.store().token_of(actor)?.map(|token| token.id);
        Ok(settle(record, vec![Target::new(actor, token)]))
    }
}

/// The acting user's targets, narrowed to the allegiance and count the item
/// allows.
pub(super) struct SelectedTargets;

#[async_trait]
impl StepExecutor for SelectedTargets {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let store = cx.session.store();
        let caster = store.token_of(record.actor)?;
        let tokens = cx.session.spatial().targeted_tokens(record.user.id)?;
        let mut tokens = targets_of(&cx, &tokens)?;

        if let Some(caster) = &caster {
            match cx.item.target.shape {
                TargetShape::Ally => {
                    tokens.retain(|token| token.disposition.is_ally_of(caster.disposition))
                }
                TargetShape::Enemy => {
                    tokens.retain(|token| token.disposition.is_enemy_of(caster.disposition))
                }
                _ => {}
            }
        }
        if let Some(limit) = cx.item.target.value.filter(|limit| *limit > 0) {
            tokens.truncate(limit as usize);
        }

        Ok(settle(record, as_targets(&tokens)))
    }
}

/// Places the item's area template and targets every token it covers.
/// Cancels when it covers none; the template stays in place.
///
/// With a `"splash"` argument the template is centred on the effect bearer
/// without prompting; otherwise the acting user places it.
pub(super) struct PlaceTemplate;

impl PlaceTemplate {
    fn place(
        cx: &StepContext<'_>,
        record: &mut ActivationRecord,
        origin: Position,
    ) -> Result<StepOutcome, StepError> {
        let store = cx.session.store();
        let caster = store.token_of(record.actor)?;
        let attached = caster
            .as_ref()
            .filter(|token| token.position == origin)
            .map(|token| token.id);

        let template = store.create_template(NewTemplate {
            shape: cx.item.target.shape,
            origin,
            size: cx.item.target.value.unwrap_or(0),
            author: record.user.id,
            attached_token: attached,
            owner: record.id,
        })?;

        if let Some(mut token) = caster.filter(|token| Some(token.id) == attached) {
            token.attached_template = Some(template.id);
            store.save_token(&token)?;
        }
        if let Some(master) = record.master_effect
            && let Some(mut effect) = store.effect(master)?
        {
            effect.flags.template = Some(template.id);
            store.save_effect(&effect)?;
        }

        record.template = Some(template.id);
        record.targets = covered(cx, &template)?;
        tracing::debug!(
            target: "runtime::steps",
            activation = %record.id,
            template = %template.id,
            targets = record.targets.len(),
            "template placed"
        );
        if record.targets.is_empty() {
            return Ok(StepOutcome::Cancel("template covers no targets".into()));
        }
        Ok(StepOutcome::output(StepOutput::Template(template.id)))
    }
}

fn covered(cx: &StepContext<'_>, template: &TemplateState) -> Result<Vec<Target>, StepError> {
    let tokens = cx.session.spatial().tokens_in_template(template)?;
    let tokens = targets_of(cx, &tokens)?;
    Ok(as_targets(&tokens))
}

#[async_trait]
impl StepExecutor for PlaceTemplate {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        if cx.step.arg(0).and_then(StepArg::as_text) == Some("splash") {
            let bearer = effective_actor(&cx, record)?;
            let origin = cx
                .session
                .store()
                .token_of(bearer)?
                .map(|token| token.position)
                .ok_or_else(|| StepError::Failed(format!("{bearer} has no token to splash from")))?;
            return Self::place(&cx, record, origin);
        }

        match cx.input {
            None => Ok(StepOutcome::Suspend(InputRequest::PlaceTemplate {
                shape: cx.item.target.shape,
                size: cx.item.target.value.unwrap_or(0),
            })),
            Some(InputResponse::Template { origin }) => Self::place(&cx, record, origin),
            Some(InputResponse::Decline) => {
                Ok(StepOutcome::Cancel("template placement dismissed".into()))
            }
            Some(_) => Err(cx.unexpected_input()),
        }
    }
}

/// Lets the acting user confirm or edit the target list.
pub(super) struct ConfirmTargets;

#[async_trait]
impl StepExecutor for ConfirmTargets {
    async fn execute(
        &self,
        cx: StepContext<'_>,
        record: &mut ActivationRecord,
    ) -> Result<StepOutcome, StepError> {
        let confirmed = match &cx.input {
            None if record.pre_roll.skip_configuration_dialog => record.targets.clone(),
            None => {
                return Ok(StepOutcome::Suspend(InputRequest::ConfirmTargets {
                    candidates: record.targets.clone(),
                }));
            }
            Some(InputResponse::Targets { targets }) => targets.clone(),
            Some(InputResponse::Decline) => Vec::new(),
            Some(_) => return Err(cx.unexpected_input()),
        };

        if confirmed.is_empty() {
            return Ok(StepOutcome::Cancel("no targets confirmed".into()));
        }
        Ok(settle(record, confirmed))
    }
}
