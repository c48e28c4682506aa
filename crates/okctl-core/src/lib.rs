//! okctl core: identity, validation, the error taxonomy and every resource
//! kind's types and options, plus the wire protocol shared by the daemon
//! and its clients.

pub mod charts;
pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod policies;
pub mod protocol;
pub mod resource;
pub mod stack;
pub mod types;
pub mod validation;

pub use context::Ctx;
pub use error::{Error, ErrorContext, Kind, Result};
pub use id::Id;
pub use protocol::{Request, Response};
pub use resource::{Keyed, Resource};
pub use validation::{Validate, Validator};
