//! Records the core reads from the document store.
//!
//! The core never owns these records; the runtime loads them from its store
//! collaborator, hands snapshots to pure functions, and writes the results back.
mod actor;
mod common;
mod effect;
mod ids;
mod token;

pub use actor::{ActorState, DamageTraits, HitPoints, User, UserRole};
pub use common::{Disposition, Position};
pub use effect::{AuraDisposition, AuraTag, EffectFlags, EffectState, NewEffect};
pub use ids::{
    ActivationId, ActorId, EffectId, ItemId, MessageId, TemplateId, TokenId, UserId,
};
pub use token::{TemplateState, TokenState};
