//! Trigger conditions and the matrix that validates them.

mod condition;
pub mod matrix;

pub use condition::{
    Condition, add_condition, remove_condition, updates_for, validate_conditions,
};
pub use matrix::{
    ActionSpec, Applicability, ConditionScope, EventSpec, TriggerMatrix, UpdateAction,
    event_matches, events,
};
