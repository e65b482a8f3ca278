//! In-memory document store for tests and local sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use skirmish_core::aura::within_range;
use skirmish_core::{
    ActivationId, ActorId, ActorState, EffectId, EffectState, ItemId, ItemTraits, MessageId,
    NewEffect, RecordRef, RulesConfig, TemplateId, TemplateState, TokenId, TokenState, UserId,
};
use skirmish_content::{ContentFactory, LoadResult};

use super::{
    DocumentStore, MessageRecord, NewMessage, NewTemplate, RepositoryError, Result, SpatialIndex,
};
use crate::activation::ActivationRecord;

#[derive(Default)]
struct Documents {
    next_id: u64,
    items: BTreeMap<ItemId, ItemTraits>,
    actors: BTreeMap<ActorId, ActorState>,
    tokens: BTreeMap<TokenId, TokenState>,
    effects: BTreeMap<EffectId, EffectState>,
    templates: BTreeMap<TemplateId, TemplateState>,
    messages: BTreeMap<MessageId, MessageRecord>,
    activations: BTreeMap<ActivationId, ActivationRecord>,
    targets: HashMap<UserId, Vec<TokenId>>,
}

impl Documents {
    /// Identifiers are never reused, even across record kinds.
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn reserve(&mut self, id: u64) {
        self.next_id = self.next_id.max(id);
    }
}

/// In-memory implementation of [`DocumentStore`] and [`SpatialIndex`].
///
/// Every record lives behind one lock, so each call observes a consistent
/// snapshot. Area membership treats every template shape as a radius around
/// its origin.
pub struct InMemoryStore {
    documents: RwLock<Documents>,
    rules: RulesConfig,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_rules(RulesConfig::default())
    }

    pub fn with_rules(rules: RulesConfig) -> Self {
        Self {
            documents: RwLock::new(Documents::default()),
            rules,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Documents>> {
        self.documents
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Documents>> {
        self.documents
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)
    }

    /// Store seeded with the rules and item catalog of a content directory.
    pub fn from_content(content: &ContentFactory) -> LoadResult<Self> {
        let store = Self::with_rules(content.load_rules()?);
        for item in content.load_items()? {
            store.put_item(item)?;
        }
        Ok(store)
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Seeds an item record.
    pub fn put_item(&self, item: ItemTraits) -> Result<()> {
        let mut documents = self.write()?;
        documents.reserve(item.id.0);
        documents.items.insert(item.id, item);
        Ok(())
    }

    /// Removes an item record, as when the host deletes it from the catalog.
    pub fn remove_item(&self, id: ItemId) -> Result<Option<ItemTraits>> {
        Ok(self.write()?.items.remove(&id))
    }

    /// Seeds an actor record.
    pub fn put_actor(&self, actor: ActorState) -> Result<()> {
        let mut documents = self.write()?;
        documents.reserve(actor.id.0);
        documents.actors.insert(actor.id, actor);
        Ok(())
    }

    /// Seeds a token record.
    pub fn put_token(&self, token: TokenState) -> Result<()> {
        let mut documents = self.write()?;
        documents.reserve(token.id.0);
        documents.tokens.insert(token.id, token);
        Ok(())
    }

    /// Replaces the tokens `user` has targeted.
    pub fn set_targets(&self, user: UserId, tokens: impl IntoIterator<Item = TokenId>) -> Result<()> {
        let mut documents = self.write()?;
        documents.targets.insert(user, tokens.into_iter().collect());
        Ok(())
    }

    /// Every stored message, oldest first.
    pub fn messages(&self) -> Result<Vec<MessageRecord>> {
        Ok(self.read()?.messages.values().cloned().collect())
    }

    /// Every stored template.
    pub fn templates(&self) -> Result<Vec<TemplateState>> {
        Ok(self.read()?.templates.values().cloned().collect())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryStore {
    fn item(&self, id: ItemId) -> Result<Option<ItemTraits>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    fn actor(&self, id: ActorId) -> Result<Option<ActorState>> {
        Ok(self.read()?.actors.get(&id).cloned())
    }

    fn save_actor(&self, actor: &ActorState) -> Result<()> {
        let mut documents = self.write()?;
        match documents.actors.get_mut(&actor.id) {
            Some(stored) => {
                *stored = actor.clone();
                Ok(())
            }
            None => Err(RepositoryError::missing(RecordRef::Actor(actor.id))),
        }
    }

    fn token(&self, id: TokenId) -> Result<Option<TokenState>> {
        Ok(self.read()?.tokens.get(&id).cloned())
    }

    fn tokens(&self) -> Result<Vec<TokenState>> {
        Ok(self.read()?.tokens.values().cloned().collect())
    }

    fn save_token(&self, token: &TokenState) -> Result<()> {
        let mut documents = self.write()?;
        match documents.tokens.get_mut(&token.id) {
            Some(stored) => {
                *stored = token.clone();
                Ok(())
            }
            None => Err(RepositoryError::missing(RecordRef::Token(token.id))),
        }
    }

    fn delete_token(&self, id: TokenId) -> Result<Option<TokenState>> {
        Ok(self.write()?.tokens.remove(&id))
    }

    fn effect(&self, id: EffectId) -> Result<Option<EffectState>> {
        Ok(self.read()?.effects.get(&id).cloned())
    }

    fn effects(&self) -> Result<Vec<EffectState>> {
        Ok(self.read()?.effects.values().cloned().collect())
    }

    fn create_effect(&self, effect: NewEffect) -> Result<EffectState> {
        let mut documents = self.write()?;
        if !documents.actors.contains_key(&effect.actor) {
            return Err(RepositoryError::missing(RecordRef::Actor(effect.actor)));
        }
        let id = EffectId(documents.allocate());
        let state = effect.into_state(id);
        documents.effects.insert(id, state.clone());
        Ok(state)
    }

    fn save_effect(&self, effect: &EffectState) -> Result<()> {
        let mut documents = self.write()?;
        match documents.effects.get_mut(&effect.id) {
            Some(stored) => {
                *stored = effect.clone();
                Ok(())
            }
            None => Err(RepositoryError::missing(RecordRef::Effect(effect.id))),
        }
    }

    fn delete_effect(&self, id: EffectId) -> Result<Option<EffectState>> {
        Ok(self.write()?.effects.remove(&id))
    }

    fn template(&self, id: TemplateId) -> Result<Option<TemplateState>> {
        Ok(self.read()?.templates.get(&id).cloned())
    }

    fn create_template(&self, template: NewTemplate) -> Result<TemplateState> {
        let mut documents = self.write()?;
        let id = TemplateId(documents.allocate());
        let state = TemplateState {
            id,
            shape: template.shape,
            origin: template.origin,
            size: template.size,
            author: template.author,
            attached_token: template.attached_token,
            owners: vec![template.owner],
        };
        documents.templates.insert(id, state.clone());
        Ok(state)
    }

    fn save_template(&self, template: &TemplateState) -> Result<()> {
        let mut documents = self.write()?;
        match documents.templates.get_mut(&template.id) {
            Some(stored) => {
                *stored = template.clone();
                Ok(())
            }
            None => Err(RepositoryError::missing(RecordRef::Template(template.id))),
        }
    }

    fn delete_template(&self, id: TemplateId) -> Result<Option<TemplateState>> {
        Ok(self.write()?.templates.remove(&id))
    }

    fn message(&self, id: MessageId) -> Result<Option<MessageRecord>> {
        Ok(self.read()?.messages.get(&id).cloned())
    }

    fn create_message(&self, message: NewMessage) -> Result<MessageRecord> {
        let mut documents = self.write()?;
        let id = MessageId(documents.allocate());
        let record = MessageRecord {
            id,
            author: message.author,
            visibility: message.visibility,
            content: message.content,
            flags: message.flags,
            created_at: Utc::now(),
        };
        documents.messages.insert(id, record.clone());
        Ok(record)
    }

    fn save_message(&self, message: &MessageRecord) -> Result<()> {
        let mut documents = self.write()?;
        match documents.messages.get_mut(&message.id) {
            Some(stored) => {
                *stored = message.clone();
                Ok(())
            }
            None => Err(RepositoryError::missing(RecordRef::Message(message.id))),
        }
    }

    fn delete_message(&self, id: MessageId) -> Result<Option<MessageRecord>> {
        Ok(self.write()?.messages.remove(&id))
    }

    fn next_activation_id(&self) -> Result<ActivationId> {
        Ok(ActivationId(self.write()?.allocate()))
    }

    fn activation(&self, id: ActivationId) -> Result<Option<ActivationRecord>> {
        Ok(self.read()?.activations.get(&id).cloned())
    }

    fn save_activation(&self, record: &ActivationRecord) -> Result<()> {
        let mut documents = self.write()?;
        documents.reserve(record.id.0);
        documents.activations.insert(record.id, record.clone());
        Ok(())
    }
}

impl SpatialIndex for InMemoryStore {
    fn targeted_tokens(&self, user: UserId) -> Result<Vec<TokenId>> {
        let documents = self.read()?;
        Ok(documents
            .targets
            .get(&user)
            .map(|tokens| {
                tokens
                    .iter()
                    .copied()
                    .filter(|id| documents.tokens.contains_key(id))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn tokens_in_template(&self, template: &TemplateState) -> Result<Vec<TokenId>> {
        let documents = self.read()?;
        Ok(documents
            .tokens
            .values()
            .filter(|token| {
                within_range(template.origin, token.position, template.size, &self.rules)
            })
            .map(|token| token.id)
            .collect())
    }
}
