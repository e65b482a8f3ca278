//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod matrix;
mod plan;
mod validate;

pub use matrix::Matrix;
pub use plan::PlanItem;
pub use validate::Validate;
