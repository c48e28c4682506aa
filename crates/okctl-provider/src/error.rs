//! Collaborator error types.

use okctl_core::{Error, Kind};
use thiserror::Error;

/// Messages cloud SDKs use when a waiter gives up on a resource.
const WAIT_TIMEOUT_MARKERS: &[&str] = &[
    "exceeded wait attempts",
    "ResourceNotReady",
    "exceeded max wait time",
    "context deadline exceeded",
];

/// Errors returned by collaborators.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("stack {stack} failed: {reason}")]
    Stack { stack: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<ProviderError>,
    },

    /// An already classified error, e.g. a cancelled context.
    #[error(transparent)]
    Core(#[from] Error),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

fn is_wait_timeout(message: &str) -> bool {
    WAIT_TIMEOUT_MARKERS.iter().any(|m| message.contains(m))
}

impl ProviderError {
    /// Classify the failure. A waiter that gave up is a `Timeout` even when
    /// it only surfaces as an API or stack failure message.
    pub fn kind(&self) -> Kind {
        match self {
            ProviderError::NotFound(_) => Kind::NotExist,
            ProviderError::Timeout(_) => Kind::Timeout,
            ProviderError::Api(message) | ProviderError::Stack { reason: message, .. } => {
                if is_wait_timeout(message) {
                    Kind::Timeout
                } else {
                    Kind::Internal
                }
            }
            ProviderError::InvalidConfig(_) => Kind::Internal,
            ProviderError::Wrapped { source, .. } => source.kind(),
            ProviderError::Core(e) => e.kind(),
        }
    }

    /// True when the innermost error is an already classified core error.
    fn wraps_core(&self) -> bool {
        match self {
            ProviderError::Core(_) => true,
            ProviderError::Wrapped { source, .. } => source.wraps_core(),
            _ => false,
        }
    }

    pub fn context(self, context: impl Into<String>) -> Self {
        ProviderError::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Core(inner) => inner,
            // contexts become stages so the core error keeps its detail
            ProviderError::Wrapped { context, source } if source.wraps_core() => {
                Error::from(*source).stage(context)
            }
            other => Error::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiter_messages_are_timeouts() {
        let err = ProviderError::Stack {
            stack: "eksctl-okctl-staging-cluster".into(),
            reason: "ResourceNotReady: exceeded wait attempts".into(),
        };
        assert_eq!(err.kind(), Kind::Timeout);

        let err = ProviderError::Api("AccessDenied".into());
        assert_eq!(err.kind(), Kind::Internal);
    }

    #[test]
    fn wrapped_errors_keep_inner_kind() {
        let err = ProviderError::Api("exceeded wait attempts".into())
            .context("waiting for stack")
            .context("creating certificate stack");
        assert_eq!(err.kind(), Kind::Timeout);

        let core: Error = err.into();
        assert_eq!(core.kind(), Kind::Timeout);
        assert_eq!(
            core.message(),
            "creating certificate stack: waiting for stack: API error: exceeded wait attempts"
        );
    }

    #[test]
    fn not_found_is_not_exist() {
        let core: Error = ProviderError::NotFound("stack okctl-vpc-x".into()).into();
        assert_eq!(core.kind(), Kind::NotExist);
    }

    #[test]
    fn wrapped_core_errors_keep_their_detail() {
        let invalid =
            Error::invalid("Name: cannot be blank").with_detail("Name", "cannot be blank");
        let core: Error = ProviderError::from(invalid)
            .context("rendering template")
            .context("creating policy stack")
            .into();

        assert_eq!(core.kind(), Kind::Invalid);
        assert_eq!(core.detail()["Name"], "cannot be blank");
        assert_eq!(core.stages(), ["creating policy stack", "rendering template"]);
        assert_eq!(core.message(), "Name: cannot be blank");
    }

    #[test]
    fn core_errors_pass_through() {
        let canceled = Error::new(Kind::Canceled, "context canceled");
        let core: Error = ProviderError::from(canceled.clone()).into();
        assert_eq!(core, canceled);
    }
}
