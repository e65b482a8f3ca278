//! Runtime orchestration for item activations.
//!
//! This crate executes the plans `skirmish-core` builds: it persists each
//! activation as a resumable record, runs built-in and registered steps
//! against a document store, relays privileged work, authors chat cards and
//! reacts to scene changes reported by the host. Consumers build a
//! [`Session`] and drive it through its [`SessionContext`].
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the context, the host API and the builder
//! - [`activation`] holds the record, input prompts and the runner
//! - [`steps`] provides the step registry and every built-in step
//! - [`cards`] renders activation cards and damage cards
//! - [`hooks`] reacts to host events (auras, turns, effect lifecycle, mirrors)
//! - [`events`] provides the topic-based event bus
//! - [`repository`] defines the document store and spatial index collaborators
pub mod activation;
pub mod aura;
pub mod cards;
pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod repository;
pub mod session;
pub mod steps;

mod workers;

pub use activation::{
    ActivationRecord, ActivationRequest, ActivationRunner, ActivationState, InputRequest,
    InputResponse, RollMode, StepOutput, Target,
};
pub use aura::{AuraOutcome, AuraReconciler};
pub use cards::{ActivationCard, Audience, DamageCard, DamageCardRequest};
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError, StepError};
pub use events::{
    ActivationEvent, AuraEvent, DamageEvent, Event, EventBus, Topic, TriggerEvent,
};
pub use hooks::{HookCriticality, HookRegistry, HostEvent, HostHook};
pub use repository::{
    DocumentStore, InMemoryStore, MessageLinks, MessageRecord, RepositoryError, SpatialIndex,
    Visibility,
};
pub use session::{Session, SessionBuilder, SessionContext, SharedMacroEvaluator};
pub use steps::{
    Dice, ScriptedDice, SeededDice, StepContext, StepExecutor, StepHandle, StepOutcome,
    StepRegistry,
};
pub use workers::{RelayHandle, RemovalQueue};
