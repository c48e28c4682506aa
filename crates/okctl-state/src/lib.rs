//! okctl-state: embedded state store for okctl.
//!
//! Backed by [redb](https://docs.rs/redb). Each cluster gets its own
//! database file and every call opens and closes it. Each resource kind owns
//! one table keyed by its business key; rows are JSON envelopes carrying
//! creation, update and soft-delete metadata around a storage-shaped copy
//! of the domain value.

pub mod error;
pub mod repository;
pub mod store;
pub mod stored;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use repository::{Repository, ResourceStore};
pub use store::StateStore;
pub use stored::Storable;
pub use types::{Envelope, Metadata, StoredId};
