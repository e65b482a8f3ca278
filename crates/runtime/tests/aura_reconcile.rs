use std::sync::Arc;

use runtime::repository::{NewMessage, NewTemplate, Result as StoreResult};
use runtime::{
    ActivationRecord, DocumentStore, InMemoryStore, MessageRecord, RepositoryError,
    RuntimeConfig, ScriptedDice, Session, SpatialIndex,
};
use skirmish_core::{
    ActivationId, ActorId, ActorState, AuraDisposition, AuraTag, Disposition, EffectFlags,
    EffectId, EffectState, HitPoints, ItemId, ItemTraits, MessageId, NewEffect, Position,
    TemplateId, TemplateState, TokenId, TokenState, UserId,
};

/// In-memory store whose writes fail for one actor's new effects and for one
/// effect's deletion.
struct FlakyStore {
    inner: InMemoryStore,
    reject_grants_for: ActorId,
    reject_delete_of: EffectId,
}

impl DocumentStore for FlakyStore {
    fn item(&self, id: ItemId) -> StoreResult<Option<ItemTraits>> {
        self.inner.item(id)
    }

    fn actor(&self, id: ActorId) -> StoreResult<Option<ActorState>> {
        self.inner.actor(id)
    }

    fn save_actor(&self, actor: &ActorState) -> StoreResult<()> {
        self.inner.save_actor(actor)
    }

    fn token(&self, id: TokenId) -> StoreResult<Option<TokenState>> {
        self.inner.token(id)
    }

    fn tokens(&self) -> StoreResult<Vec<TokenState>> {
        self.inner.tokens()
    }

    fn save_token(&self, token: &TokenState) -> StoreResult<()> {
        self.inner.save_token(token)
    }

    fn delete_token(&self, id: TokenId) -> StoreResult<Option<TokenState>> {
        self.inner.delete_token(id)
    }

    fn effect(&self, id: EffectId) -> StoreResult<Option<EffectState>> {
        self.inner.effect(id)
    }

    fn effects(&self) -> StoreResult<Vec<EffectState>> {
        self.inner.effects()
    }

    fn create_effect(&self, effect: NewEffect) -> StoreResult<EffectState> {
        if effect.actor == self.reject_grants_for {
            return Err(RepositoryError::LockPoisoned);
        }
        self.inner.create_effect(effect)
    }

    fn save_effect(&self, effect: &EffectState) -> StoreResult<()> {
        self.inner.save_effect(effect)
    }

    fn delete_effect(&self, id: EffectId) -> StoreResult<Option<EffectState>> {
        if id == self.reject_delete_of {
            return Err(RepositoryError::LockPoisoned);
        }
        self.inner.delete_effect(id)
    }

    fn template(&self, id: TemplateId) -> StoreResult<Option<TemplateState>> {
        self.inner.template(id)
    }

    fn create_template(&self, template: NewTemplate) -> StoreResult<TemplateState> {
        self.inner.create_template(template)
    }

    fn save_template(&self, template: &TemplateState) -> StoreResult<()> {
        self.inner.save_template(template)
    }

    fn delete_template(&self, id: TemplateId) -> StoreResult<Option<TemplateState>> {
        self.inner.delete_template(id)
    }

    fn message(&self, id: MessageId) -> StoreResult<Option<MessageRecord>> {
        self.inner.message(id)
    }

    fn create_message(&self, message: NewMessage) -> StoreResult<MessageRecord> {
        self.inner.create_message(message)
    }

    fn save_message(&self, message: &MessageRecord) -> StoreResult<()> {
        self.inner.save_message(message)
    }

    fn delete_message(&self, id: MessageId) -> StoreResult<Option<MessageRecord>> {
        self.inner.delete_message(id)
    }

    fn next_activation_id(&self) -> StoreResult<ActivationId> {
        self.inner.next_activation_id()
    }

    fn activation(&self, id: ActivationId) -> StoreResult<Option<ActivationRecord>> {
        self.inner.activation(id)
    }

    fn save_activation(&self, record: &ActivationRecord) -> StoreResult<()> {
        self.inner.save_activation(record)
    }
}

impl SpatialIndex for FlakyStore {
    fn targeted_tokens(&self, user: UserId) -> StoreResult<Vec<TokenId>> {
        self.inner.targeted_tokens(user)
    }

    fn tokens_in_template(&self, template: &TemplateState) -> StoreResult<Vec<TokenId>> {
        self.inner.tokens_in_template(template)
    }
}

fn creature(store: &InMemoryStore, actor: u64, at: Option<Position>, disposition: Disposition) {
    store
        .put_actor(ActorState::new(ActorId(actor), "Creature", HitPoints::new(10, 10)))
        .expect("seed actor");
    if let Some(at) = at {
        store
            .put_token(TokenState::new(TokenId(actor + 1), ActorId(actor), at, disposition))
            .expect("seed token");
    }
}

fn stale_grant(store: &InMemoryStore, source: EffectId, actor: u64) -> EffectState {
    store
        .create_effect(
            NewEffect::new(ActorId(actor), "Spirit Guardians").with_flags(EffectFlags {
                aura_source: Some(source),
                ..EffectFlags::default()
            }),
        )
        .expect("seed stale grant")
}

/// A store failure on one entry of the delta skips that entry only.
///
/// 1. The aura reaches two goblins; granting the first one fails
/// 2. Two stale grants are due for removal; deleting the first one fails
/// 3. The rest of the delta still applies and the pass succeeds
#[tokio::test]
async fn failing_writes_skip_only_their_own_entries() {
    let inner = InMemoryStore::new();
    creature(&inner, 10, Some(Position::ORIGIN), Disposition::Friendly);
    creature(&inner, 20, Some(Position::new(2, 0)), Disposition::Hostile);
    creature(&inner, 30, Some(Position::new(0, 2)), Disposition::Hostile);
    creature(&inner, 40, None, Disposition::Hostile);
    creature(&inner, 50, None, Disposition::Hostile);

    let source = inner
        .create_effect(
            NewEffect::new(ActorId(10), "Spirit Guardians").with_flags(EffectFlags {
                aura: Some(AuraTag {
                    range: 15,
                    disposition: AuraDisposition::Enemy,
                }),
                ..EffectFlags::default()
            }),
        )
        .expect("seed aura source");
    let removable = stale_grant(&inner, source.id, 40);
    let stuck = stale_grant(&inner, source.id, 50);

    let rules = inner.rules().clone();
    let store = Arc::new(FlakyStore {
        inner,
        reject_grants_for: ActorId(20),
        reject_delete_of: stuck.id,
    });
    let session = Session::builder()
        .config(RuntimeConfig::with_rules(rules))
        .store(Arc::clone(&store))
        .dice(Arc::new(ScriptedDice::new([], 10)))
        .build()
        .await
        .expect("session should start");

    let outcome = session
        .reconcile_auras()
        .await
        .expect("the pass should succeed despite failed writes");

    let created: Vec<_> = outcome.created.iter().map(|effect| effect.actor).collect();
    assert_eq!(created, vec![ActorId(30)]);
    let removed: Vec<_> = outcome.removed.iter().map(|effect| effect.id).collect();
    assert_eq!(removed, vec![removable.id]);

    assert!(store.effects_on(ActorId(20)).expect("read").is_empty());
    assert_eq!(store.effects_on(ActorId(30)).expect("read").len(), 1);
    assert!(store.effects_on(ActorId(40)).expect("read").is_empty());
    assert_eq!(
        store.effects_on(ActorId(50)).expect("read"),
        vec![stuck]
    );

    session.shutdown().await.expect("session should shut down");
}
