//! Store contracts the runtime reads and writes through.
//!
//! The runtime never holds records across an `await`: every operation loads a
//! fresh snapshot, computes, and writes the result back. A record that vanished
//! in between surfaces as [`RepositoryError::Missing`].

use skirmish_core::{
    ActivationId, ActorId, ActorState, EffectId, EffectState, ItemId, ItemTraits, MessageId,
    NewEffect, RecordRef, TemplateId, TemplateState, TokenId, TokenState, UserId,
};

use super::{MessageRecord, NewMessage, NewTemplate, RepositoryError, Result};
use crate::activation::ActivationRecord;

/// Document store holding every record the runtime touches.
pub trait DocumentStore: Send + Sync {
    fn item(&self, id: ItemId) -> Result<Option<ItemTraits>>;

    fn actor(&self, id: ActorId) -> Result<Option<ActorState>>;

    fn save_actor(&self, actor: &ActorState) -> Result<()>;

    fn token(&self, id: TokenId) -> Result<Option<TokenState>>;

    /// Every token on the scene, ordered by identifier.
    fn tokens(&self) -> Result<Vec<TokenState>>;

    fn save_token(&self, token: &TokenState) -> Result<()>;

    /// Removes and returns the token, if it still exists.
    fn delete_token(&self, id: TokenId) -> Result<Option<TokenState>>;

    fn effect(&self, id: EffectId) -> Result<Option<EffectState>>;

    /// Every effect in the session, ordered by identifier.
    fn effects(&self) -> Result<Vec<EffectState>>;

    fn create_effect(&self, effect: NewEffect) -> Result<EffectState>;

    /// Overwrites an existing effect; fails with `Missing` when it is gone.
    fn save_effect(&self, effect: &EffectState) -> Result<()>;

    fn delete_effect(&self, id: EffectId) -> Result<Option<EffectState>>;

    fn template(&self, id: TemplateId) -> Result<Option<TemplateState>>;

    fn create_template(&self, template: NewTemplate) -> Result<TemplateState>;

    fn save_template(&self, template: &TemplateState) -> Result<()>;

    fn delete_template(&self, id: TemplateId) -> Result<Option<TemplateState>>;

    fn message(&self, id: MessageId) -> Result<Option<MessageRecord>>;

    fn create_message(&self, message: NewMessage) -> Result<MessageRecord>;

    fn save_message(&self, message: &MessageRecord) -> Result<()>;

    fn delete_message(&self, id: MessageId) -> Result<Option<MessageRecord>>;

    fn next_activation_id(&self) -> Result<ActivationId>;

    fn activation(&self, id: ActivationId) -> Result<Option<ActivationRecord>>;

    fn save_activation(&self, record: &ActivationRecord) -> Result<()>;

    /// Effects carried by `actor`.
    fn effects_on(&self, actor: ActorId) -> Result<Vec<EffectState>> {
        Ok(self
            .effects()?
            .into_iter()
            .filter(|effect| effect.actor == actor)
            .collect())
    }

    /// First token backed by `actor`.
    fn token_of(&self, actor: ActorId) -> Result<Option<TokenState>> {
        Ok(self.tokens()?.into_iter().find(|token| token.actor == actor))
    }

    fn require_item(&self, id: ItemId) -> Result<ItemTraits> {
        self.item(id)?
            .ok_or_else(|| RepositoryError::missing(RecordRef::Item(id)))
    }

    fn require_actor(&self, id: ActorId) -> Result<ActorState> {
        self.actor(id)?
            .ok_or_else(|| RepositoryError::missing(RecordRef::Actor(id)))
    }

    fn require_activation(&self, id: ActivationId) -> Result<ActivationRecord> {
        self.activation(id)?
            .ok_or_else(|| RepositoryError::missing(RecordRef::Activation(id)))
    }
}

/// Canvas queries: what users target and which tokens an area covers.
pub trait SpatialIndex: Send + Sync {
    /// Tokens the user currently has targeted.
    fn targeted_tokens(&self, user: UserId) -> Result<Vec<TokenId>>;

    /// Tokens lying inside the template's area.
    fn tokens_in_template(&self, template: &TemplateState) -> Result<Vec<TokenId>>;
}
