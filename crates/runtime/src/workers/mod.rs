//! Background workers owned by a session.
//!
//! - [`RelayWorker`]: runs privileged steps and card writes for other users
//! - [`RemovalWorker`]: deletes linked message views in debounced batches

mod relay;
mod removal;

pub use relay::{RelayHandle, RelayWorker};
pub use removal::{RemovalQueue, RemovalWorker};
