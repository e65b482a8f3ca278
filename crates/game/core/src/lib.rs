//! Deterministic rules logic and data types for resolving activations.
//!
//! `skirmish-core` turns item traits into executable plans and answers every
//! pure rules question the runtime asks along the way: which steps a plan
//! contains, how damage changes hit points, which condition events may fire
//! which update actions, and which aura effects a scene should carry. Nothing
//! here performs I/O; the `runtime` crate owns execution and persistence.
pub mod aura;
pub mod config;
pub mod damage;
pub mod error;
pub mod flow;
pub mod item;
pub mod state;
pub mod trigger;

pub use aura::{AuraDelta, AuraGrant, plan_reconciliation};
pub use config::{DistanceMetric, RulesConfig};
pub use damage::{
    DamageEntry, DamageKind, DamagePoints, DiceFormula, FormulaError, HpChange, RolledDamage,
    compute_damage_entry, points_against,
};
pub use error::{
    AuthorizationError, ConcurrentModificationError, ConfigurationError, DomainError,
    ErrorSeverity, MissingReferenceError, RecordRef,
};
pub use flow::{
    Branch, BuiltPlan, BuiltinStep, CustomStep, DefaultFlow, Evaluator, Flow, FlowError,
    MacroEvaluator, Plan, PlanSource, PreRollOptions, Step, StepArg, StepArgs, StepName,
    build_plan,
};
pub use item::{
    ActionType, ApplicationType, DamagePart, DurationSpec, DurationUnits, EffectTemplate,
    ItemTraits, SaveSpec, TargetShape, TargetSpec,
};
pub use state::{
    ActivationId, ActorId, ActorState, AuraDisposition, AuraTag, DamageTraits, Disposition,
    EffectFlags, EffectId, EffectState, HitPoints, ItemId, MessageId, NewEffect, Position,
    TemplateId, TemplateState, TokenId, TokenState, User, UserId, UserRole,
};
pub use trigger::{
    Applicability, Condition, ConditionScope, TriggerMatrix, UpdateAction, validate_conditions,
};
