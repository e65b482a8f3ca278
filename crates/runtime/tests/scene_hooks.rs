use std::sync::Arc;
use std::time::Duration;

use runtime::{
    ActivationRequest, ActivationState, DocumentStore, InMemoryStore, InputRequest,
    InputResponse, RuntimeConfig, ScriptedDice, Session,
};
use skirmish_content::ContentFactory;
use skirmish_core::{
    ActorId, ActorState, DamageEntry, Disposition, EffectState, HitPoints, ItemId, Position,
    TokenId, TokenState, User, UserId,
};

const PLAYER: UserId = UserId(1);
const FIREBALL: ItemId = ItemId(2);
const SPIRIT_GUARDIANS: ItemId = ItemId(4);

const CLERIC: ActorId = ActorId(10);
const CLERIC_TOKEN: TokenId = TokenId(11);
const GOBLIN: ActorId = ActorId(20);
const GOBLIN_TOKEN: TokenId = TokenId(21);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Player-owned cleric at the origin and a hostile goblin two squares east.
fn scene() -> Arc<InMemoryStore> {
    let content = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../game/content/data"));
    let store = InMemoryStore::from_content(&content).expect("bundled content should load");

    store
        .put_actor(ActorState::new(CLERIC, "Aldric", HitPoints::new(30, 30)).with_owner(PLAYER))
        .expect("seed cleric");
    store
        .put_token(TokenState::new(
            CLERIC_TOKEN,
            CLERIC,
            Position::ORIGIN,
            Disposition::Friendly,
        ))
        .expect("seed cleric token");
    store
        .put_actor(ActorState::new(GOBLIN, "Goblin", HitPoints::new(40, 40)))
        .expect("seed goblin");
    store
        .put_token(TokenState::new(
            GOBLIN_TOKEN,
            GOBLIN,
            Position::new(2, 0),
            Disposition::Hostile,
        ))
        .expect("seed goblin token");

    Arc::new(store)
}

async fn session(store: &Arc<InMemoryStore>, dice: Arc<ScriptedDice>) -> Session {
    Session::builder()
        .config(RuntimeConfig::with_rules(store.rules().clone()))
        .store(Arc::clone(store))
        .dice(dice)
        .build()
        .await
        .expect("session should start")
}

/// Damage entries written for `actor`, oldest card first.
fn damage_entries(store: &InMemoryStore, actor: ActorId) -> Vec<DamageEntry> {
    store
        .messages()
        .expect("read messages")
        .into_iter()
        .filter_map(|message| message.flags.damage_card)
        .filter(|card| card.actor == actor)
        .map(|card| card.entry)
        .collect()
}

fn effects_on(store: &InMemoryStore, actor: ActorId) -> Vec<EffectState> {
    store.effects_on(actor).expect("read effects")
}

/// Aura with area and turn conditions.
///
/// 1. Casting creates the aura on the cleric and a grant on the goblin
/// 2. The grant's arrival fires `enemy-enters-area` (save fails: 12 radiant)
/// 3. The goblin's turn fires `start-of-turn-target` (save succeeds: 6 halved to 3)
/// 4. A repeated turn report fires nothing
/// 5. Leaving the area removes the grant; returning fires the entry again
/// 6. Dropping concentration tears down every effect of the cast
#[tokio::test]
async fn spirit_guardians_fires_area_and_turn_conditions() {
    init_tracing();
    let store = scene();
    let dice = Arc::new(ScriptedDice::new([3, 4, 4, 4], 1));
    let session = session(&store, Arc::clone(&dice)).await;

    // ================================================================
    // Casting
    // ================================================================
    let record = session
        .activate(ActivationRequest::new(CLERIC, SPIRIT_GUARDIANS, User::player(PLAYER)))
        .await
        .expect("activation should run");
    assert_eq!(record.state, ActivationState::Completed);
    let master = record.master_effect.expect("master effect recorded");

    let on_cleric = effects_on(&store, CLERIC);
    assert_eq!(on_cleric.len(), 3);
    assert!(on_cleric.iter().any(|effect| effect.flags.concentration));
    let source = on_cleric
        .iter()
        .find(|effect| effect.flags.aura.is_some())
        .cloned()
        .expect("aura source on the cleric");
    assert_eq!(source.flags.casting_actor, Some(CLERIC));

    let master_effect = store.effect(master).expect("read").expect("master exists");
    assert!(master_effect.flags.is_master);
    assert_eq!(master_effect.flags.child_effects, vec![source.id]);

    let cleric = store.require_actor(CLERIC).expect("cleric");
    assert_eq!(cleric.turn_updated_effects, vec![source.id]);

    // ================================================================
    // Entering: the goblin already stands inside the aura
    // ================================================================
    let on_goblin = effects_on(&store, GOBLIN);
    assert_eq!(on_goblin.len(), 1);
    assert_eq!(on_goblin[0].flags.aura_source, Some(source.id));

    let entries = damage_entries(&store, GOBLIN);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].hp_dmg, 12);

    // ================================================================
    // Turns
    // ================================================================
    dice.push([18, 2, 2, 2]);
    session
        .change_turn(1, 1, Some(CLERIC), GOBLIN)
        .await
        .expect("turn change should succeed");

    let entries = damage_entries(&store, GOBLIN);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].hp_dmg, 3);

    session
        .change_turn(1, 1, Some(CLERIC), GOBLIN)
        .await
        .expect("repeated turn report should succeed");
    assert_eq!(damage_entries(&store, GOBLIN).len(), 2);

    // ================================================================
    // Movement
    // ================================================================
    session
        .move_token(UserId(0), GOBLIN_TOKEN, Position::new(10, 0))
        .await
        .expect("move out should succeed");
    assert!(effects_on(&store, GOBLIN).is_empty());

    session
        .move_token(UserId(0), GOBLIN_TOKEN, Position::new(3, 0))
        .await
        .expect("move back should succeed");
    assert_eq!(effects_on(&store, GOBLIN).len(), 1);
    assert_eq!(damage_entries(&store, GOBLIN).len(), 3);

    // ================================================================
    // Concentration ends
    // ================================================================
    let concentration = effects_on(&store, CLERIC)
        .into_iter()
        .find(|effect| effect.flags.concentration)
        .expect("concentration effect");
    session
        .delete_effect(concentration.id)
        .await
        .expect("deleting concentration should succeed");

    assert!(effects_on(&store, CLERIC).is_empty());
    assert!(effects_on(&store, GOBLIN).is_empty());
    assert!(
        store
            .require_actor(CLERIC)
            .expect("cleric")
            .turn_updated_effects
            .is_empty()
    );

    session.shutdown().await.expect("session should shut down");
}

/// Deleting the master card removes the other views after the quiet period,
/// releases the template and cancels the activation.
#[tokio::test(start_paused = true)]
async fn deleting_the_master_card_tears_down_the_activation() {
    let store = scene();
    let session = session(&store, Arc::new(ScriptedDice::new([], 10))).await;

    let record = session
        .activate(ActivationRequest::new(CLERIC, FIREBALL, User::player(PLAYER)))
        .await
        .expect("activation should start");
    let record = session
        .resume(
            record.id,
            InputResponse::Template {
                origin: Position::new(2, 0),
            },
        )
        .await
        .expect("placing the template should succeed");
    assert!(matches!(
        record.pending_input,
        Some(InputRequest::ConfirmTargets { .. })
    ));
    assert_eq!(store.templates().expect("templates").len(), 1);

    let links = record.messages;
    assert_eq!(links.iter().count(), 3);
    assert_eq!(store.messages().expect("messages").len(), 3);

    let master = links.master.expect("master view");
    session
        .delete_message(master)
        .await
        .expect("deleting the card should succeed");

    let record = store.require_activation(record.id).expect("record kept");
    assert_eq!(record.state, ActivationState::Cancelled);
    assert_eq!(record.error.as_deref(), Some("card deleted"));
    assert_eq!(record.template, None);
    assert!(store.templates().expect("templates").is_empty());

    // The linked views go once the removal queue has been quiet long enough
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(store.messages().expect("messages").is_empty());

    session.shutdown().await.expect("session should shut down");
}

/// Removing a non-master view queues the other views, master included, and
/// the master leaving through the queue tears down the activation too.
///
/// 1. Place the template so the activation owns one
/// 2. Delete the privileged mirror
/// 3. After the quiet period every view is gone, the template released and
///    the activation cancelled
#[tokio::test(start_paused = true)]
async fn deleting_a_mirror_tears_down_the_activation_through_the_queue() {
    let store = scene();
    let session = session(&store, Arc::new(ScriptedDice::new([], 10))).await;

    let record = session
        .activate(ActivationRequest::new(CLERIC, FIREBALL, User::player(PLAYER)))
        .await
        .expect("activation should start");
    let record = session
        .resume(
            record.id,
            InputResponse::Template {
                origin: Position::new(2, 0),
            },
        )
        .await
        .expect("placing the template should succeed");
    assert!(record.template.is_some());
    assert_eq!(store.templates().expect("templates").len(), 1);

    let mirror = record.messages.gm.expect("privileged mirror");
    session
        .delete_message(mirror)
        .await
        .expect("deleting the mirror should succeed");
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(store.messages().expect("messages").is_empty());
    let record = store.require_activation(record.id).expect("record kept");
    assert_eq!(record.state, ActivationState::Cancelled);
    assert_eq!(record.error.as_deref(), Some("card deleted"));
    assert_eq!(record.template, None);
    assert!(store.templates().expect("templates").is_empty());

    session.shutdown().await.expect("session should shut down");
}

/// A template placed on the caster follows the caster and goes with its token.
#[tokio::test]
async fn attached_template_follows_its_token() {
    let store = scene();
    let session = session(&store, Arc::new(ScriptedDice::new([], 10))).await;

    let record = session
        .activate(ActivationRequest::new(CLERIC, FIREBALL, User::player(PLAYER)))
        .await
        .expect("activation should start");
    let record = session
        .resume(
            record.id,
            InputResponse::Template {
                origin: Position::ORIGIN,
            },
        )
        .await
        .expect("placing the template should succeed");

    let template = record.template.expect("template placed");
    let token = store.token(CLERIC_TOKEN).expect("read").expect("cleric token");
    assert_eq!(token.attached_template, Some(template));

    // Someone else moving the token leaves the template in place
    session
        .move_token(UserId(0), CLERIC_TOKEN, Position::new(1, 0))
        .await
        .expect("move should succeed");
    let placed = store.template(template).expect("read").expect("template exists");
    assert_eq!(placed.origin, Position::ORIGIN);

    session
        .move_token(PLAYER, CLERIC_TOKEN, Position::new(3, 1))
        .await
        .expect("move should succeed");
    let placed = store.template(template).expect("read").expect("template exists");
    assert_eq!(placed.origin, Position::new(2, 1));

    session
        .delete_token(CLERIC_TOKEN)
        .await
        .expect("token deletion should succeed");
    assert_eq!(store.template(template).expect("read"), None);

    session.shutdown().await.expect("session should shut down");
}
