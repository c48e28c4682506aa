//! Interceptor chain around the dispatcher.
//!
//! A [`Chain`] is built once at composition time: the middlewares run in
//! the order they were added, each handing off to the next, and the last
//! one hands off to the dispatcher. Middlewares observe; they never change
//! the request, the response or the error passing through.

use std::sync::Arc;

use async_trait::async_trait;
use okctl_core::{Ctx, Request, Response, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dispatch::Handler;

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, ctx: &Ctx, request: Request, next: Next<'_>) -> Result<Response>;
}

/// The rest of the chain.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl Next<'_> {
    pub async fn run(self, ctx: &Ctx, request: Request) -> Result<Response> {
        match self.middlewares.split_first() {
            Some((first, rest)) => {
                let next = Next {
                    middlewares: rest,
                    handler: self.handler,
                };
                first.call(ctx, request, next).await
            }
            None => self.handler.handle(ctx, request).await,
        }
    }
}

pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            middlewares: Vec::new(),
            handler,
        }
    }

    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }
}

#[async_trait]
impl Handler for Chain {
    async fn handle(&self, ctx: &Ctx, request: Request) -> Result<Response> {
        Next {
            middlewares: &self.middlewares,
            handler: self.handler.as_ref(),
        }
        .run(ctx, request)
        .await
    }
}

/// Field names whose string values are replaced by a fingerprint when
/// anonymizing.
const SENSITIVE_FIELDS: &[&str] = &["secret", "privateKey", "clientSecret", "password"];

/// Logs every request, and its outcome with the elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging {
    pub anonymize: bool,
}

impl Logging {
    pub fn new(anonymize: bool) -> Self {
        Self { anonymize }
    }

    fn render(&self, value: &impl serde::Serialize) -> String {
        match serde_json::to_value(value) {
            Ok(mut value) => {
                if self.anonymize {
                    anonymize(&mut value);
                }
                value.to_string()
            }
            Err(e) => format!("<unserializable: {e}>"),
        }
    }
}

#[async_trait]
impl Middleware for Logging {
    async fn call(&self, ctx: &Ctx, request: Request, next: Next<'_>) -> Result<Response> {
        let operation = request.name();
        info!(operation, "received");
        debug!(operation, request = %self.render(&request), "request");

        let started = Instant::now();
        let result = next.run(ctx, request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                debug!(operation, response = %self.render(response), "response");
                info!(operation, elapsed_ms, "completed");
            }
            Err(e) => warn!(operation, elapsed_ms, kind = %e.kind(), error = %e, "failed"),
        }
        result
    }
}

/// Replace sensitive string values, at any depth, with a short SHA-256
/// fingerprint.
pub fn anonymize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                match field {
                    Value::String(s) if SENSITIVE_FIELDS.contains(&key.as_str()) => {
                        *s = fingerprint(s);
                    }
                    other => anonymize(other),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(anonymize),
        _ => {}
    }
}

fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    format!("sha256:{}", &hex::encode(digest)[..12])
}
