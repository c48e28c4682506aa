//! okctl services.
//!
//! Resource services validate options, call the kind's provider and
//! persist the result. Composites (identity pool, ArgoCD, monitoring,
//! controllers) drive several resource services in a fixed order.
//! [`Services`] wires them all from a provider set and a state store;
//! [`Handler`] dispatches protocol requests onto it, optionally through a
//! middleware [`Chain`].

pub mod argocd;
pub mod controller;
pub mod dispatch;
mod generate;
pub mod github;
pub mod identity_pool;
pub mod middleware;
pub mod monitoring;
pub mod resource;
pub mod services;

pub use argocd::ArgoCdService;
pub use controller::ControllerService;
pub use dispatch::Handler;
pub use github::OAuthAppService;
pub use identity_pool::IdentityPoolService;
pub use middleware::{Chain, Logging, Middleware, Next};
pub use monitoring::MonitoringService;
pub use resource::ResourceService;
pub use services::Services;
