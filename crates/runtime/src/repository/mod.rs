//! Document store abstractions and the in-memory implementation.
mod error;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryStore;
pub use traits::{DocumentStore, SpatialIndex};
pub use types::{
    DamageCardState, MessageFlags, MessageLinks, MessageRecord, NewMessage, NewTemplate,
    Visibility,
};
