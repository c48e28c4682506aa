//! Error taxonomy shared by every okctl layer.
//!
//! An [`Error`] carries a [`Kind`], a chain of stage descriptions
//! (outermost first), the root message and an optional detail map. The
//! innermost layer that knows the true kind sets it; outer layers only add
//! stages. [`Error::with_kind`] refines a generic kind but never replaces a
//! specific one, so a `Timeout` raised deep inside a provider is still a
//! `Timeout` when it reaches the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias used across okctl crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Local validation failed; no external call was made.
    Invalid,
    /// A collaborator failed for an unspecified reason.
    Internal,
    /// Local persistence failed.
    #[serde(rename = "IO")]
    Io,
    /// The entity does not exist.
    NotExist,
    /// A collaborator exceeded its deadline.
    Timeout,
    /// A payload could not be decoded.
    Unmarshal,
    /// A payload could not be decrypted.
    Decrypt,
    /// The operation was cancelled by the caller.
    Canceled,
}

impl Kind {
    /// Generic kinds may be refined by outer layers.
    pub fn is_generic(self) -> bool {
        matches!(self, Kind::Internal)
    }

    /// Whether a caller may reasonably retry an operation that failed with this kind.
    pub fn is_retryable(self) -> bool {
        matches!(self, Kind::Timeout | Kind::Internal | Kind::Io)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Invalid => "Invalid",
            Kind::Internal => "Internal",
            Kind::Io => "IO",
            Kind::NotExist => "NotExist",
            Kind::Timeout => "Timeout",
            Kind::Unmarshal => "Unmarshal",
            Kind::Decrypt => "Decrypt",
            Kind::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified okctl error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.stages, .message))]
pub struct Error {
    kind: Kind,
    stages: Vec<String>,
    message: String,
    detail: BTreeMap<String, String>,
}

fn render(stages: &[String], message: &str) -> String {
    let mut out = String::new();
    for stage in stages {
        out.push_str(stage);
        out.push_str(": ");
    }
    out.push_str(message);
    out
}

impl Error {
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stages: Vec::new(),
            message: message.into(),
            detail: BTreeMap::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(Kind::Invalid, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Kind::Internal, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(Kind::Io, message)
    }

    pub fn not_exist(message: impl Into<String>) -> Self {
        Self::new(Kind::NotExist, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(Kind::Timeout, message)
    }

    pub fn unmarshal(message: impl Into<String>) -> Self {
        Self::new(Kind::Unmarshal, message)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.kind == kind
    }

    /// Root message without stages.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stage descriptions, outermost first.
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn detail(&self) -> &BTreeMap<String, String> {
        &self.detail
    }

    /// Prepend a stage description.
    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stages.insert(0, stage.into());
        self
    }

    /// Refine the kind. A specific kind is never replaced.
    pub fn with_kind(mut self, kind: Kind) -> Self {
        if self.kind.is_generic() {
            self.kind = kind;
        }
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    pub fn with_details(mut self, detail: BTreeMap<String, String>) -> Self {
        self.detail.extend(detail);
        self
    }
}

/// Stage wrapping for results.
pub trait ErrorContext<T> {
    /// Prepend `stage` to the error chain, keeping the kind.
    fn stage(self, stage: &str) -> Result<T>;

    /// Prepend a lazily built stage description.
    fn with_stage<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn stage(self, stage: &str) -> Result<T> {
        self.map_err(|e| e.into().stage(stage))
    }

    fn with_stage<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.into().stage(f()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::unmarshal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_stage_chain() {
        let err = Error::timeout("exceeded wait attempts")
            .stage("calling provider")
            .stage("creating cluster");
        assert_eq!(
            err.to_string(),
            "creating cluster: calling provider: exceeded wait attempts"
        );
        assert_eq!(err.message(), "exceeded wait attempts");
    }

    #[test]
    fn specific_kind_is_never_downgraded() {
        let err = Error::timeout("slow").with_kind(Kind::Internal);
        assert_eq!(err.kind(), Kind::Timeout);

        let err = Error::invalid("bad").with_kind(Kind::Io);
        assert_eq!(err.kind(), Kind::Invalid);
    }

    #[test]
    fn generic_kind_is_refined() {
        let err = Error::internal("stack rollback").with_kind(Kind::Timeout);
        assert_eq!(err.kind(), Kind::Timeout);
    }

    #[test]
    fn stage_on_result_keeps_kind() {
        let res: Result<()> = Err(Error::not_exist("no such zone"));
        let err = res.stage("deleting hosted zone").unwrap_err();
        assert_eq!(err.kind(), Kind::NotExist);
        assert_eq!(err.stages(), ["deleting hosted zone"]);
    }

    #[test]
    fn kind_serializes_with_wire_names() {
        assert_eq!(serde_json::to_string(&Kind::Io).unwrap(), "\"IO\"");
        let kind: Kind = serde_json::from_str("\"Timeout\"").unwrap();
        assert_eq!(kind, Kind::Timeout);
    }
}
