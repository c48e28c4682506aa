//! okctl-api: HTTP API for okctl.
//!
//! Routes come from [`okctl_core::protocol::ROUTES`]: one path per
//! capability, the verb selects the operation.
//!
//! | Method | Meaning | Success |
//! |---|---|---|
//! | POST | create | 201 with the created resource |
//! | GET | read | 200 with the stored resource or status |
//! | DELETE | delete | 204, empty body |
//!
//! Request bodies are the JSON-encoded options. Errors answer with an
//! `ErrorResponse` body and a status derived from the error kind.

pub mod handlers;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{MethodFilter, MethodRouter};
use okctl_core::Ctx;
use okctl_core::config::{ResponseEncoding, ServerConfig};
use okctl_core::protocol::{ROUTES, Verb};
use okctl_service::Handler;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub handler: Arc<dyn Handler>,
    pub encoding: ResponseEncoding,
    /// Deadline for each request; `None` runs until the client goes away.
    pub request_timeout: Option<Duration>,
}

impl ApiState {
    pub fn new(handler: Arc<dyn Handler>, server: &ServerConfig) -> Self {
        Self {
            handler,
            encoding: server.response_encoding,
            request_timeout: match server.request_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    fn context(&self) -> Ctx {
        match self.request_timeout {
            Some(timeout) => Ctx::with_timeout(timeout),
            None => Ctx::background(),
        }
    }
}

fn method_filter(verb: Verb) -> MethodFilter {
    match verb {
        Verb::Get => MethodFilter::GET,
        Verb::Post => MethodFilter::POST,
        Verb::Delete => MethodFilter::DELETE,
    }
}

/// Build the API router.
pub fn build_router(state: ApiState) -> Router {
    let mut paths: BTreeMap<&'static str, MethodRouter<ApiState>> = BTreeMap::new();
    for route in ROUTES {
        let operation = route.operation;
        let verb = route.verb;
        let handler = move |State(state): State<ApiState>, body: Bytes| async move {
            let ctx = state.context();
            handlers::dispatch(&state, &ctx, operation, verb, &body).await
        };
        let methods = paths.remove(route.path).unwrap_or_else(MethodRouter::new);
        paths.insert(route.path, methods.on(method_filter(verb), handler));
    }

    paths
        .into_iter()
        .fold(Router::new(), |router, (path, methods)| router.route(path, methods))
        .with_state(state)
}
