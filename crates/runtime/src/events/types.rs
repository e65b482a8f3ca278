//! Event types for different topics.

use serde::{Deserialize, Serialize};
use skirmish_core::{ActivationId, ActorId, DamageEntry, EffectId, MessageId, StepName};

use crate::activation::{ActivationState, InputRequest};

/// Activation lifecycle notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActivationEvent {
    Created {
        activation: ActivationId,
        steps: usize,
    },
    StepCompleted {
        activation: ActivationId,
        index: usize,
        step: StepName,
    },
    AwaitingInput {
        activation: ActivationId,
        request: InputRequest,
    },
    AttackCompleted {
        activation: ActivationId,
        hits: usize,
        misses: usize,
    },
    Completed {
        activation: ActivationId,
    },
    /// The activation ended without completing its plan.
    Aborted {
        activation: ActivationId,
        state: ActivationState,
        reason: Option<String>,
    },
}

/// Hit point writes made by damage cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DamageEvent {
    Applied {
        card: MessageId,
        actor: ActorId,
        /// Signed net change; negative when hit points were lost.
        dhp: i32,
        entry: DamageEntry,
    },
    Undone {
        card: MessageId,
        actor: ActorId,
        dhp: i32,
        entry: DamageEntry,
    },
}

/// Outcome of one aura reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuraEvent {
    Reconciled { created: usize, removed: usize },
}

/// A condition event fired for an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub event: String,
    pub actor: ActorId,
    /// Effect whose condition list is consulted, when one is known.
    pub effect: Option<EffectId>,
    pub activation: Option<ActivationId>,
}
