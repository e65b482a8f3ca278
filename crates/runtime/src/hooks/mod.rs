//! Host-event hook system.
//!
//! The host reports scene changes (token moves, effect toggles, deletions,
//! turn changes) as [`HostEvent`]s. Hooks registered on the session react to
//! them and may return follow-up events, which are processed in the same
//! dispatch until the queue drains.
//!
//! # Architecture
//!
//! - Hooks are registered in the [`SessionBuilder`](crate::SessionBuilder) and sorted by priority
//! - Every event is offered to each hook whose `should_trigger()` accepts it
//! - Follow-up events run breadth-first after the event that produced them
//! - A cascade larger than `RuntimeConfig::max_hook_events` aborts the dispatch

mod aura;
mod conditions;
mod effects;
mod mirror;
mod registry;
mod templates;
mod turns;

pub use aura::AuraHook;
pub use conditions::ConditionHook;
pub use effects::EffectLifecycleHook;
pub use mirror::{GmMirrorHook, LinkedRemovalHook};
pub(crate) use mirror::tear_down_activation;
pub use registry::HookRegistry;
pub use templates::TemplateHook;
pub use turns::{TurnHook, TurnTracker};

use async_trait::async_trait;
use skirmish_core::{
    ActorId, EffectId, EffectState, Position, TemplateState, TokenId, TokenState, UserId,
};

use crate::error::Result;
use crate::repository::MessageRecord;
use crate::session::SessionContext;

/// Scene changes reported by the host, plus the condition events hooks derive
/// from them.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    TokenMoved {
        token: TokenId,
        user: UserId,
        from: Position,
        to: Position,
    },
    TokenDeleted {
        token: TokenState,
    },
    EffectCreated {
        effect: EffectState,
    },
    /// An effect was enabled or disabled.
    EffectToggled {
        effect: EffectId,
    },
    EffectDeleted {
        effect: EffectState,
    },
    TemplateDeleted {
        template: TemplateState,
    },
    MessageCreated {
        message: MessageRecord,
    },
    MessageDeleted {
        message: MessageRecord,
    },
    TurnChanged {
        round: u32,
        turn: u32,
        previous: Option<ActorId>,
        current: ActorId,
    },
    /// `event` fired for `bearer`; `listener` holds the condition list.
    ///
    /// For plain effects both are the same effect. For auras the listener is
    /// the source and the bearer the derived effect on the affected actor.
    ConditionFired {
        listener: EffectId,
        bearer: EffectId,
        event: String,
    },
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::TokenMoved { .. } => "token_moved",
            HostEvent::TokenDeleted { .. } => "token_deleted",
            HostEvent::EffectCreated { .. } => "effect_created",
            HostEvent::EffectToggled { .. } => "effect_toggled",
            HostEvent::EffectDeleted { .. } => "effect_deleted",
            HostEvent::TemplateDeleted { .. } => "template_deleted",
            HostEvent::MessageCreated { .. } => "message_created",
            HostEvent::MessageDeleted { .. } => "message_deleted",
            HostEvent::TurnChanged { .. } => "turn_changed",
            HostEvent::ConditionFired { .. } => "condition_fired",
        }
    }
}

/// Defines the criticality level of a hook for error handling.
///
/// - Critical hooks must succeed or the dispatch fails
/// - Important hooks log errors but allow continuation
/// - Optional hooks can fail quietly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCriticality {
    /// Hook failure fails the whole dispatch.
    Critical,

    /// Hook failure is logged and the remaining hooks still run.
    ///
    /// This is the default level.
    Important,

    /// Hook failure is logged at debug level only.
    Optional,
}

/// Reacts to host events.
///
/// Hooks are sorted by priority (lower values run first).
#[async_trait]
pub trait HostHook: Send + Sync {
    /// Name used in logging and debugging.
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    fn should_trigger(&self, event: &HostEvent) -> bool;

    /// Handles `event` and returns follow-up events to dispatch.
    async fn handle(&self, ctx: &SessionContext, event: &HostEvent) -> Result<Vec<HostEvent>>;
}
