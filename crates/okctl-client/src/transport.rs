//! How a request reaches the services.
//!
//! [`DirectTransport`] calls the in-process handler; [`RemoteTransport`]
//! sends the request to an okctl daemon over HTTP. Both return the same
//! typed errors: a remote error response is decoded back into the kind,
//! message and detail the server produced.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use okctl_core::protocol::{ErrorResponse, Verb, decode_body};
use okctl_core::{Ctx, Error, Kind, Request, Response, Result};
use okctl_service::Handler;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// Calls the handler in-process.
#[derive(Clone)]
pub struct DirectTransport {
    handler: Arc<dyn Handler>,
    timeout: Option<Duration>,
}

impl DirectTransport {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler, timeout: None }
    }

    /// Give every request a deadline, like the daemon does.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let ctx = match self.timeout {
            Some(timeout) => Ctx::with_timeout(timeout),
            None => Ctx::background(),
        };
        self.handler.handle(&ctx, request).await
    }
}

/// Failures of the HTTP exchange itself, before any okctl error could be
/// read.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("sending {operation}: {source}")]
    Send {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading {operation} response: {source}")]
    Read {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} answered {status} with an unreadable error body: {body}")]
    ErrorBody {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        let kind = match &e {
            TransportError::Send { source, .. } | TransportError::Read { source, .. }
                if source.is_timeout() =>
            {
                Kind::Timeout
            }
            // a proxy in front of the daemon answers in plain text
            TransportError::ErrorBody { status, .. } if *status == StatusCode::GATEWAY_TIMEOUT => {
                Kind::Timeout
            }
            TransportError::ErrorBody { status, .. } if *status == StatusCode::REQUEST_TIMEOUT => {
                Kind::Canceled
            }
            TransportError::ErrorBody { .. } => Kind::Unmarshal,
            _ => Kind::Internal,
        };
        Error::new(kind, e.to_string())
    }
}

/// Talks to an okctl daemon.
#[derive(Debug, Clone)]
pub struct RemoteTransport {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteTransport {
    /// `base_url` is the daemon address, e.g. `http://127.0.0.1:8085`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn method(verb: Verb) -> reqwest::Method {
        match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for RemoteTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let operation = request.name();
        let url = format!("{}{}", self.base_url, request.path());
        debug!(operation, %url, "sending");

        let response = self
            .client
            .request(Self::method(request.verb()), &url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body()?)
            .send()
            .await
            .map_err(|source| TransportError::Send { operation, source })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Read { operation, source })?;

        if status.as_u16() >= 400 {
            let decoded: ErrorResponse =
                serde_json::from_slice(&body).map_err(|_| TransportError::ErrorBody {
                    operation,
                    status,
                    body: String::from_utf8_lossy(&body).into_owned(),
                })?;
            return Err(decoded.into_error());
        }

        if content_type.starts_with("application/json") || body.is_empty() {
            return request.decode_response(&body);
        }
        // YAML (and pretty printed text) are re-read as JSON values first
        let value: serde_json::Value = decode_body(&content_type, &body)?;
        request.decode_response(&serde_json::to_vec(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::post;
    use okctl_api::{ApiState, build_router};
    use okctl_core::config::{ResponseEncoding, ServerConfig};
    use okctl_core::types::*;
    use okctl_core::{Id, Kind};
    use okctl_provider::ProviderError;
    use okctl_provider::testing::SpySet;
    use okctl_service::Services;
    use okctl_state::StateStore;
    use tokio::net::TcpListener;

    use super::*;
    use crate::api::{ClusterApi, VpcApi};
    use crate::client::Client;

    fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    fn vpc_opts() -> CreateVpcOpts {
        CreateVpcOpts {
            id: id(),
            cidr: "192.168.0.0/20".to_string(),
            minimal: false,
        }
    }

    fn services(spies: &SpySet) -> Arc<dyn Handler> {
        Arc::new(Services::new(spies.providers(), StateStore::open_in_memory().unwrap()))
    }

    async fn spawn(router: axum::Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    async fn daemon(handler: Arc<dyn Handler>, encoding: ResponseEncoding) -> String {
        let server = ServerConfig {
            response_encoding: encoding,
            ..Default::default()
        };
        spawn(build_router(ApiState::new(handler, &server))).await
    }

    #[tokio::test]
    async fn wait_timeout_is_timeout_over_both_transports() {
        let spies = SpySet::new();
        spies.vpc.fail_create(|| ProviderError::Stack {
            stack: "okctl-vpc-okctl-staging".to_string(),
            reason: "exceeded wait attempts".to_string(),
        });
        let handler = services(&spies);

        let direct = Client::direct(handler.clone());
        let remote = Client::remote(daemon(handler, ResponseEncoding::Json).await);

        let local = direct.create_vpc(vpc_opts()).await.unwrap_err();
        let over_http = remote.create_vpc(vpc_opts()).await.unwrap_err();

        assert_eq!(local.kind(), Kind::Timeout);
        assert_eq!(over_http.kind(), Kind::Timeout);
        assert_eq!(local.to_string(), over_http.to_string());
        assert_eq!(spies.vpc.creates(), 2);
    }

    #[tokio::test]
    async fn invalid_options_keep_their_detail_remotely() {
        let spies = SpySet::new();
        let remote = Client::remote(daemon(services(&spies), ResponseEncoding::Json).await);

        let err = remote.create_cluster(CreateClusterOpts::default()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert_eq!(err.detail()["VpcID"], "cannot be blank");
        assert_eq!(spies.cluster.creates(), 0);
    }

    #[tokio::test]
    async fn remote_round_trip_matches_direct() {
        let spies = SpySet::new();
        let handler = services(&spies);
        let remote = Client::remote(daemon(handler.clone(), ResponseEncoding::Json).await);

        let created = remote.create_vpc(vpc_opts()).await.unwrap();
        assert_eq!(created.id, id());
        remote.delete_vpc(DeleteVpcOpts { id: id() }).await.unwrap();
        assert_eq!(spies.vpc.deletes(), 1);

        let missing = Client::direct(handler)
            .get_cluster(GetClusterOpts { id: id() })
            .await
            .unwrap_err();
        let missing_remote = remote.get_cluster(GetClusterOpts { id: id() }).await.unwrap_err();
        assert_eq!(missing.kind(), Kind::NotExist);
        assert_eq!(missing_remote.kind(), Kind::NotExist);
    }

    #[tokio::test]
    async fn yaml_responses_are_decoded() {
        let spies = SpySet::new();
        let remote = Client::remote(daemon(services(&spies), ResponseEncoding::Yaml).await);

        let vpc = remote.create_vpc(vpc_opts()).await.unwrap();
        assert_eq!(vpc.cidr, "192.168.0.0/20");
        assert!(!vpc.private_subnets.is_empty());
    }

    #[tokio::test]
    async fn unreadable_error_body_is_unmarshal() {
        let router = axum::Router::new().route(
            "/v1/vpcs/",
            post(|| async { (HttpStatus::BAD_GATEWAY, "upstream went away") }),
        );
        let remote = RemoteTransport::new(spawn(router).await);

        let err = remote.send(Request::CreateVpc(vpc_opts())).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Unmarshal);
        assert!(err.message().contains("upstream went away"));
    }

    #[tokio::test]
    async fn plain_text_timeouts_keep_their_kind() {
        let router = axum::Router::new()
            .route(
                "/v1/vpcs/",
                post(|| async { (HttpStatus::GATEWAY_TIMEOUT, "upstream timed out") }),
            )
            .route(
                "/v1/clusters/",
                post(|| async { (HttpStatus::REQUEST_TIMEOUT, "request timed out") }),
            );
        let remote = RemoteTransport::new(spawn(router).await);

        let err = remote.send(Request::CreateVpc(vpc_opts())).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Timeout);
        assert!(err.message().contains("upstream timed out"));

        let err = remote
            .send(Request::CreateCluster(CreateClusterOpts::default()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Canceled);
    }

    #[tokio::test]
    async fn unreachable_daemon_is_internal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = RemoteTransport::new(format!("http://{addr}"))
            .send(Request::CreateVpc(vpc_opts()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Internal);
        assert!(err.message().starts_with("sending CreateVpc"));
    }

    #[tokio::test]
    async fn direct_deadline_cancels_a_stalled_provider() {
        let spies = SpySet::new();
        spies.vpc.stall(Duration::from_secs(5));
        let direct = DirectTransport::new(services(&spies)).with_timeout(Duration::from_millis(20));

        let err = direct.send(Request::CreateVpc(vpc_opts())).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Timeout);
    }
}
