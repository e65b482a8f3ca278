//! Activations: one execution of an item's plan, and the runner that drives it.
mod input;
mod record;
mod runner;

pub use input::{InputRequest, InputResponse, RollMode};
pub use record::{
    ActivationRecord, ActivationState, AttackResult, SaveResult, StepOutput, Target, TargetDamage,
};
pub use runner::{ActivationRequest, ActivationRunner};
