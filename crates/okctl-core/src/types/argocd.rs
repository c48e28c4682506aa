//! ArgoCD: certificate, GitHub login, session secret, secret manifests and
//! the chart, created in that order.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::types::certificate::Certificate;
use crate::types::github::{GithubRepository, OAuthApp};
use crate::types::helm::HelmRelease;
use crate::types::kube::Manifest;
use crate::types::parameter::SecretParameter;
use crate::validation::{Validate, Validator};

pub const ARGOCD_NAMESPACE: &str = "argocd";
pub const ARGOCD_RELEASE: &str = "argocd";
/// Kubernetes secret holding the session key and the Dex client secret.
pub const ARGOCD_SECRET: &str = "argocd-secret";
/// Kubernetes secret holding the deploy key.
pub const ARGOCD_PRIVATE_KEY: &str = "argocd-privatekey";
/// Parameter name of the generated session secret.
pub const SECRET_KEY_NAME: &str = "argocd/secret_key";

pub fn argo_domain(domain: &str) -> String {
    format!("argocd.{}", domain.trim_end_matches('.'))
}

pub fn argo_url(domain: &str) -> String {
    format!("https://{}", argo_domain(domain))
}

pub fn oauth_app_name(cluster_name: &str) -> String {
    format!("okctl-argocd-{cluster_name}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArgoCdOpts {
    pub id: Id,
    /// Cluster domain; ArgoCD is served from `argocd.<domain>`.
    pub domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
    pub repository: GithubRepository,
}

impl Validate for CreateArgoCdOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain)
            .required("HostedZoneID", &self.hosted_zone_id)
            .nested("Repository", &self.repository);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteArgoCdOpts {
    pub id: Id,
    pub domain: String,
    pub organisation: String,
}

impl Validate for DeleteArgoCdOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain)
            .required("Organisation", &self.organisation);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetArgoCdOpts {
    pub id: Id,
    pub domain: String,
}

impl Validate for GetArgoCdOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgoCd {
    pub id: Id,
    pub argo_domain: String,
    #[serde(rename = "argoURL")]
    pub argo_url: String,
    pub certificate: Certificate,
    pub oauth_app: OAuthApp,
    pub secret_key: SecretParameter,
    pub manifests: Vec<Manifest>,
    pub helm: HelmRelease,
}
