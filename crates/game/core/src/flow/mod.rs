//! Flow definition language.
//!
//! An [`Evaluator`] composes predicate guards and operations on a [`Flow`]
//! into a [`Branch`] tree, which is flattened (with a bounded depth) into the
//! [`Plan`] the runtime executes. Which steps appear in a plan is decided
//! here; what a step does is decided by the runtime's step table.

mod branch;
mod builder;
mod default;
mod error;
mod evaluator;
mod step;

pub use branch::Branch;
pub use builder::{CustomStep, Flow, PreRollOptions};
pub use default::DefaultFlow;
pub use error::FlowError;
pub use evaluator::{BuiltPlan, Evaluator, MacroEvaluator, PlanSource, build_plan};
pub use step::{BuiltinStep, Plan, Step, StepArg, StepArgs, StepName};
