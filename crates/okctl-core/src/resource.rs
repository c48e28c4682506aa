//! The contract shared by every provisioned resource kind.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::id::Id;
use crate::validation::Validate;

/// Options that locate an existing resource.
pub trait Keyed {
    /// Identity the resource is scoped by.
    fn id(&self) -> &Id;

    /// Unique business key within the kind.
    fn key(&self) -> String;
}

/// A provisioned resource kind.
///
/// `Create` and `Delete` are the request options of the kind. The value
/// returned by a create is what gets persisted, keyed by [`Resource::key`].
pub trait Resource:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Human readable kind name used in stage descriptions ("creating certificate").
    const KIND: &'static str;

    type Create: Validate
        + Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    type Delete: Validate
        + Keyed
        + Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    fn id(&self) -> &Id;

    fn key(&self) -> String;
}
