//! okctl collaborators.
//!
//! Services never talk to AWS, Kubernetes or GitHub directly. They call the
//! traits defined here; the daemon wires in concrete providers, tests wire
//! in spies (feature `test-utils`).

pub mod dryrun;
pub mod error;
pub mod provider;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use dryrun::{DryRun, Synthesize};
pub use error::{ProviderError, ProviderResult};
pub use provider::{CloudProvider, GithubProvider, IdentityPoolProvider, Providers};
