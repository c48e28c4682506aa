//! Wire protocol shared by the daemon and its clients.
//!
//! Every capability is one variant of [`Request`], resolved from its route
//! at the transport boundary. [`ROUTES`] is the single table both the HTTP
//! router and the remote transport are built from: POST creates, DELETE
//! deletes, GET reads. Request bodies are the JSON-encoded options.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ResponseEncoding;
use crate::error::{Error, Kind, Result};
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    /// Status code of a successful response.
    pub fn success_status(self) -> u16 {
        match self {
            Verb::Post => 201,
            Verb::Get => 200,
            Verb::Delete => 204,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub operation: &'static str,
    pub verb: Verb,
    pub path: &'static str,
}

macro_rules! decode_response {
    (Empty, $body:expr) => {{
        let _ = $body;
        Ok(Response::Empty)
    }};
    ($variant:ident, $body:expr) => {
        Ok(Response::$variant(serde_json::from_slice($body)?))
    };
}

macro_rules! operations {
    ($( $op:ident => $verb:ident $path:literal, $opts:ty => $out:ident; )*) => {
        /// A request for one capability, tagged by operation name.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "operation", content = "options")]
        pub enum Request {
            $( $op($opts), )*
        }

        impl Request {
            pub fn name(&self) -> &'static str {
                match self {
                    $( Request::$op(_) => stringify!($op), )*
                }
            }

            pub fn verb(&self) -> Verb {
                match self {
                    $( Request::$op(_) => Verb::$verb, )*
                }
            }

            pub fn path(&self) -> &'static str {
                match self {
                    $( Request::$op(_) => $path, )*
                }
            }

            /// JSON body carrying the options.
            pub fn body(&self) -> Result<Vec<u8>> {
                match self {
                    $( Request::$op(opts) => Ok(serde_json::to_vec(opts)?), )*
                }
            }

            /// Resolve a request from its operation name and JSON body.
            pub fn parse(operation: &str, body: &[u8]) -> Result<Self> {
                match operation {
                    $( stringify!($op) => Ok(Request::$op(serde_json::from_slice(body)?)), )*
                    other => Err(Error::invalid(format!("unknown operation {other}"))),
                }
            }

            /// Decode the JSON result of this request.
            pub fn decode_response(&self, body: &[u8]) -> Result<Response> {
                match self {
                    $( Request::$op(_) => decode_response!($out, body), )*
                }
            }
        }

        pub const ROUTES: &[RouteSpec] = &[
            $( RouteSpec { operation: stringify!($op), verb: Verb::$verb, path: $path }, )*
        ];
    };
}

macro_rules! responses {
    ($( $variant:ident($ty:ty), )*) => {
        /// Result of a request. Serializes as the bare inner value.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Response {
            $( $variant($ty), )*
            Empty,
        }

        impl Response {
            pub fn name(&self) -> &'static str {
                match self {
                    $( Response::$variant(_) => stringify!($variant), )*
                    Response::Empty => "Empty",
                }
            }
        }

        $(
            impl TryFrom<Response> for $ty {
                type Error = Error;

                fn try_from(response: Response) -> Result<Self> {
                    match response {
                        Response::$variant(value) => Ok(value),
                        other => Err(unexpected(stringify!($variant), &other)),
                    }
                }
            }
        )*
    };
}

fn unexpected(want: &str, got: &Response) -> Error {
    Error::unmarshal(format!("expected {want} response, got {}", got.name()))
}

impl TryFrom<Response> for () {
    type Error = Error;

    fn try_from(response: Response) -> Result<Self> {
        match response {
            Response::Empty => Ok(()),
            other => Err(unexpected("Empty", &other)),
        }
    }
}

responses! {
    Cluster(Cluster),
    Vpc(Vpc),
    Certificate(Certificate),
    HostedZone(HostedZone),
    HostedZones(Vec<HostedZone>),
    ManagedPolicy(ManagedPolicy),
    ServiceAccount(ServiceAccount),
    HelmRelease(HelmRelease),
    IdentityPool(IdentityPool),
    IdentityPoolClient(IdentityPoolClient),
    SecretParameter(SecretParameter),
    SecurityGroup(SecurityGroup),
    ContainerRepository(ContainerRepository),
    PostgresDatabase(PostgresDatabase),
    S3Bucket(S3Bucket),
    Namespace(Namespace),
    Manifest(Manifest),
    OAuthApp(OAuthApp),
    ArgoCd(ArgoCd),
    Monitoring(Monitoring),
    CompositeStatus(CompositeStatus),
    ControllerInstallation(ControllerInstallation),
}

operations! {
    CreateCluster => Post "/v1/clusters/", CreateClusterOpts => Cluster;
    DeleteCluster => Delete "/v1/clusters/", DeleteClusterOpts => Empty;
    GetCluster => Get "/v1/clusters/", GetClusterOpts => Cluster;
    CreateVpc => Post "/v1/vpcs/", CreateVpcOpts => Vpc;
    DeleteVpc => Delete "/v1/vpcs/", DeleteVpcOpts => Empty;
    CreateCertificate => Post "/v1/certificates/", CreateCertificateOpts => Certificate;
    DeleteCertificate => Delete "/v1/certificates/", DeleteCertificateOpts => Empty;
    CreateHostedZone => Post "/v1/domains/hostedzones/", CreateHostedZoneOpts => HostedZone;
    DeleteHostedZone => Delete "/v1/domains/hostedzones/", DeleteHostedZoneOpts => Empty;
    ListHostedZones => Get "/v1/domains/hostedzones/", ListHostedZonesOpts => HostedZones;
    CreatePolicy => Post "/v1/managedpolicies/", CreatePolicyOpts => ManagedPolicy;
    DeletePolicy => Delete "/v1/managedpolicies/", DeletePolicyOpts => Empty;
    CreateServiceAccount => Post "/v1/serviceaccounts/", CreateServiceAccountOpts => ServiceAccount;
    DeleteServiceAccount => Delete "/v1/serviceaccounts/", DeleteServiceAccountOpts => Empty;
    CreateHelmRelease => Post "/v1/helm/releases/", CreateHelmReleaseOpts => HelmRelease;
    DeleteHelmRelease => Delete "/v1/helm/releases/", DeleteHelmReleaseOpts => Empty;
    CreateIdentityPool => Post "/v1/identitymanagers/pools/",
        CreateIdentityPoolOpts => IdentityPool;
    DeleteIdentityPool => Delete "/v1/identitymanagers/pools/", DeleteIdentityPoolOpts => Empty;
    CreateIdentityPoolClient => Post "/v1/identitymanagers/pools/clients/",
        CreateIdentityPoolClientOpts => IdentityPoolClient;
    DeleteIdentityPoolClient => Delete "/v1/identitymanagers/pools/clients/",
        DeleteIdentityPoolClientOpts => Empty;
    CreateSecret => Post "/v1/parameters/secrets/", CreateSecretOpts => SecretParameter;
    DeleteSecret => Delete "/v1/parameters/secrets/", DeleteSecretOpts => Empty;
    CreateSecurityGroup => Post "/v1/securitygroups/", CreateSecurityGroupOpts => SecurityGroup;
    DeleteSecurityGroup => Delete "/v1/securitygroups/", DeleteSecurityGroupOpts => Empty;
    CreateContainerRepository => Post "/v1/containerrepositories/",
        CreateContainerRepositoryOpts => ContainerRepository;
    DeleteContainerRepository => Delete "/v1/containerrepositories/",
        DeleteContainerRepositoryOpts => Empty;
    CreatePostgresDatabase => Post "/v1/components/postgres/",
        CreatePostgresDatabaseOpts => PostgresDatabase;
    DeletePostgresDatabase => Delete "/v1/components/postgres/",
        DeletePostgresDatabaseOpts => Empty;
    CreateS3Bucket => Post "/v1/components/s3buckets/", CreateS3BucketOpts => S3Bucket;
    DeleteS3Bucket => Delete "/v1/components/s3buckets/", DeleteS3BucketOpts => Empty;
    CreateNamespace => Post "/v1/kube/namespaces/", CreateNamespaceOpts => Namespace;
    DeleteNamespace => Delete "/v1/kube/namespaces/", DeleteNamespaceOpts => Empty;
    CreateManifest => Post "/v1/kube/manifests/", CreateManifestOpts => Manifest;
    DeleteManifest => Delete "/v1/kube/manifests/", DeleteManifestOpts => Empty;
    CreateOAuthApp => Post "/v1/github/oauthapps/", CreateOAuthAppOpts => OAuthApp;
    DeleteOAuthApp => Delete "/v1/github/oauthapps/", DeleteOAuthAppOpts => Empty;
    CreateArgoCd => Post "/v1/argocd/", CreateArgoCdOpts => ArgoCd;
    DeleteArgoCd => Delete "/v1/argocd/", DeleteArgoCdOpts => Empty;
    GetArgoCd => Get "/v1/argocd/", GetArgoCdOpts => CompositeStatus;
    CreateMonitoring => Post "/v1/monitoring/", CreateMonitoringOpts => Monitoring;
    DeleteMonitoring => Delete "/v1/monitoring/", DeleteMonitoringOpts => Empty;
    GetMonitoring => Get "/v1/monitoring/", GetMonitoringOpts => CompositeStatus;
    CreateAutoscaler => Post "/v1/autoscaler/", CreateAutoscalerOpts => ControllerInstallation;
    DeleteAutoscaler => Delete "/v1/autoscaler/", DeleteControllerOpts => Empty;
    CreateBlockstorage => Post "/v1/blockstorage/",
        CreateBlockstorageOpts => ControllerInstallation;
    DeleteBlockstorage => Delete "/v1/blockstorage/", DeleteControllerOpts => Empty;
    CreateAwsLoadBalancerController => Post "/v1/awsloadbalancercontroller/",
        CreateAwsLoadBalancerControllerOpts => ControllerInstallation;
    DeleteAwsLoadBalancerController => Delete "/v1/awsloadbalancercontroller/",
        DeleteControllerOpts => Empty;
    CreateExternalDns => Post "/v1/externaldns/", CreateExternalDnsOpts => ControllerInstallation;
    DeleteExternalDns => Delete "/v1/externaldns/", DeleteControllerOpts => Empty;
    CreateExternalSecrets => Post "/v1/externalsecrets/",
        CreateExternalSecretsOpts => ControllerInstallation;
    DeleteExternalSecrets => Delete "/v1/externalsecrets/", DeleteControllerOpts => Empty;
}

impl Request {
    /// Look up the route entry for `verb` on `path`.
    pub fn route(verb: Verb, path: &str) -> Option<&'static RouteSpec> {
        ROUTES.iter().find(|r| r.verb == verb && r.path == path)
    }
}

impl Response {
    /// Encode the result for the wire. `Empty` encodes to no bytes.
    pub fn encode(&self, encoding: ResponseEncoding) -> Result<Vec<u8>> {
        if matches!(self, Response::Empty) {
            return Ok(Vec::new());
        }
        match encoding {
            ResponseEncoding::Json => Ok(serde_json::to_vec(self)?),
            ResponseEncoding::Yaml => serde_yaml::to_string(self)
                .map(String::into_bytes)
                .map_err(|e| Error::internal(format!("encoding yaml: {e}"))),
            ResponseEncoding::Text => Ok(serde_json::to_vec_pretty(self)?),
        }
    }
}

/// Decode a response body produced with the encoding named by `content_type`.
pub fn decode_body<T: serde::de::DeserializeOwned>(content_type: &str, body: &[u8]) -> Result<T> {
    if content_type.starts_with("application/yaml") {
        serde_yaml::from_slice(body).map_err(|e| Error::unmarshal(e.to_string()))
    } else {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: Kind,
    #[serde(default)]
    pub detail: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub error_type: String,
}

pub const ERROR_TYPE: &str = "okctl.Error";

impl From<&Error> for ErrorResponse {
    fn from(e: &Error) -> Self {
        Self {
            error: e.to_string(),
            code: e.kind(),
            detail: e.detail().clone(),
            error_type: ERROR_TYPE.to_string(),
        }
    }
}

impl ErrorResponse {
    /// Rebuild the typed error on the client side.
    pub fn into_error(self) -> Error {
        Error::new(self.code, self.error).with_details(self.detail)
    }
}
