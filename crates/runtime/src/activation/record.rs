//! Persisted state of one activation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_core::{
    ActivationId, ActorId, ApplicationType, DefaultFlow, EffectId, ItemId, MessageId, Plan,
    PreRollOptions, RolledDamage, TemplateId, TokenId, User,
};

use super::input::InputRequest;
use crate::repository::MessageLinks;

/// Lifecycle of an activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    #[default]
    Pending,
    Running,
    AwaitingInput,
    Completed,
    Failed,
    Cancelled,
}

impl ActivationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// One targeted actor, with the token it was picked through when there is one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub actor: ActorId,
    pub token: Option<TokenId>,
}

impl Target {
    pub const fn new(actor: ActorId, token: Option<TokenId>) -> Self {
        Self { actor, token }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub target: Target,
    pub natural: i32,
    pub total: i32,
    pub hit: bool,
    pub critical: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub target: Target,
    pub total: i32,
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDamage {
    pub target: Target,
    pub rolls: Vec<RolledDamage>,
}

/// What a completed step left behind for the steps after it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StepOutput {
    Targets(Vec<Target>),
    Template(TemplateId),
    Attacks(Vec<AttackResult>),
    Saves(Vec<SaveResult>),
    Damage(Vec<TargetDamage>),
    Cards(Vec<MessageId>),
    Effects(Vec<EffectId>),
    Ended(Vec<EffectId>),
    Triggered(Vec<String>),
    Custom(serde_json::Value),
}

/// Activation record as persisted in the document store.
///
/// The record is written after every step, so a restarted session resumes
/// from `cursor` with all earlier outputs intact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub id: ActivationId,
    pub actor: ActorId,
    pub item: ItemId,
    pub user: User,
    pub application: ApplicationType,
    pub flow: DefaultFlow,
    /// Effect whose condition started this activation.
    pub source_effect: Option<EffectId>,
    pub plan: Plan,
    pub fingerprint: [u8; 32],
    #[serde(default)]
    pub pre_roll: PreRollOptions,
    #[serde(default)]
    pub targets: Vec<Target>,
    pub cursor: usize,
    pub state: ActivationState,
    #[serde(default)]
    pub outputs: BTreeMap<usize, StepOutput>,
    #[serde(default)]
    pub pending_input: Option<InputRequest>,
    #[serde(default)]
    pub messages: MessageLinks,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub master_effect: Option<EffectId>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

macro_rules! latest_output {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(&self) -> Option<&$ty> {
            self.outputs.values().rev().find_map(|output| match output {
                StepOutput::$variant(value) => Some(value),
                _ => None,
            })
        }
    };
}

impl ActivationRecord {
    latest_output!(
        /// Attack results of the most recent attack roll.
        attacks,
        Attacks,
        Vec<AttackResult>
    );
    latest_output!(
        /// Saving throws of the most recent saving throw step.
        saves,
        Saves,
        Vec<SaveResult>
    );
    latest_output!(damage, Damage, Vec<TargetDamage>);

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether `target` succeeded on the latest saving throw.
    pub fn saved(&self, target: &Target) -> bool {
        self.saves().is_some_and(|saves| {
            saves
                .iter()
                .any(|save| save.target.actor == target.actor && save.success)
        })
    }

    pub fn archive(&mut self, state: ActivationState) {
        self.state = state;
        self.pending_input = None;
        if self.archived_at.is_none() {
            self.archived_at = Some(Utc::now());
        }
    }
}
