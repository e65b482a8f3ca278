//! Chat cards the runtime authors.
mod activation;
mod damage;

pub use activation::{ActivationCard, Audience};
pub use damage::{DamageCard, DamageCardRequest};
