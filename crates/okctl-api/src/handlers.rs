//! Request handling shared by every route.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response as HttpResponse};
use okctl_core::protocol::{ErrorResponse, Verb};
use okctl_core::{Ctx, Error, Kind, Request, Response};
use tracing::warn;

use crate::ApiState;

/// Status code an error of `kind` is answered with.
pub fn status_for(kind: Kind) -> StatusCode {
    match kind {
        Kind::Invalid | Kind::Unmarshal => StatusCode::BAD_REQUEST,
        Kind::NotExist => StatusCode::NOT_FOUND,
        Kind::Canceled => StatusCode::REQUEST_TIMEOUT,
        Kind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        Kind::Internal | Kind::Io | Kind::Decrypt => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Typed error turned into an HTTP response.
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> HttpResponse {
        (status_for(self.0.kind()), Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Decode the body as the options of `operation`, run it and encode the
/// result.
pub async fn dispatch(
    state: &ApiState,
    ctx: &Ctx,
    operation: &'static str,
    verb: Verb,
    body: &[u8],
) -> HttpResponse {
    let request = match Request::parse(operation, body) {
        Ok(request) => request,
        Err(e) => {
            let e = e.stage("decoding request");
            warn!(operation, error = %e, "rejected");
            return ApiError(e).into_response();
        }
    };

    let response = match state.handler.handle(ctx, request).await {
        Ok(response) => response,
        Err(e) => return ApiError(e).into_response(),
    };
    if matches!(response, Response::Empty) {
        return StatusCode::NO_CONTENT.into_response();
    }

    match response.encode(state.encoding) {
        Ok(bytes) => {
            let status = StatusCode::from_u16(verb.success_status()).unwrap_or(StatusCode::OK);
            (status, [(header::CONTENT_TYPE, state.encoding.content_type())], bytes).into_response()
        }
        Err(e) => ApiError(e.stage("encoding response")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use okctl_core::config::{ResponseEncoding, ServerConfig};
    use okctl_core::types::*;
    use okctl_core::{Id, Kind};
    use okctl_provider::ProviderError;
    use okctl_provider::testing::SpySet;
    use okctl_service::{Chain, Logging, Services};
    use okctl_state::StateStore;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::build_router;

    fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    fn router(spies: &SpySet, encoding: ResponseEncoding) -> axum::Router {
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        let chain = Chain::new(Arc::new(services)).with(Logging::new(true));
        let server = ServerConfig {
            response_encoding: encoding,
            ..Default::default()
        };
        build_router(ApiState::new(Arc::new(chain), &server))
    }

    fn request(method: &str, path: &str, body: serde_json::Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn cluster_body() -> serde_json::Value {
        json!({
            "id": serde_json::to_value(id()).unwrap(),
            "cidr": "192.168.0.0/20",
            "vpcID": "vpc-123",
        })
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_answers_created() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(request("POST", "/v1/clusters/", cluster_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let cluster: Cluster = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(cluster.name, "okctl-staging");
    }

    #[tokio::test]
    async fn invalid_options_answer_bad_request() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(request(
                "POST",
                "/v1/clusters/",
                serde_json::to_value(CreateClusterOpts::default()).unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "Invalid");
        assert_eq!(body["type"], "okctl.Error");
        assert!(body["error"].as_str().unwrap().starts_with("validating inputs: AccountID"));
        assert_eq!(spies.cluster.creates(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_unmarshal() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/v1/vpcs/")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "Unmarshal");
    }

    #[tokio::test]
    async fn delete_answers_no_content() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(request(
                "DELETE",
                "/v1/vpcs/",
                json!({ "id": serde_json::to_value(id()).unwrap() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
        assert_eq!(spies.vpc.deletes(), 1);
    }

    #[tokio::test]
    async fn missing_cluster_is_not_found() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(request(
                "GET",
                "/v1/clusters/",
                json!({ "id": serde_json::to_value(id()).unwrap() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NotExist");
    }

    #[tokio::test]
    async fn provider_timeout_is_gateway_timeout() {
        let spies = SpySet::new();
        spies.cluster.fail_create(|| {
            ProviderError::Timeout("waiting for eksctl-okctl-staging-cluster".to_string())
        });
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(request("POST", "/v1/clusters/", cluster_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
        let err = body.into_error();
        assert_eq!(err.kind(), Kind::Timeout);
        assert!(err.message().starts_with("creating cluster: timeout"));
    }

    #[tokio::test]
    async fn yaml_encoding_is_selectable() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Yaml);

        let response = app
            .oneshot(request("POST", "/v1/clusters/", cluster_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/yaml");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let cluster: Cluster = serde_yaml::from_slice(&bytes).unwrap();
        assert_eq!(cluster.id, id());
    }

    #[tokio::test]
    async fn unrouted_verb_is_rejected() {
        let spies = SpySet::new();
        let app = router(&spies, ResponseEncoding::Json);

        let response = app
            .oneshot(request("GET", "/v1/vpcs/", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(Kind::Invalid), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Kind::NotExist), StatusCode::NOT_FOUND);
        assert_eq!(status_for(Kind::Canceled), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(status_for(Kind::Io), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
