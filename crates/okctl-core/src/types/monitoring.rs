//! The monitoring stack: Grafana behind Cognito login, Prometheus, Loki and
//! Promtail.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::types::certificate::Certificate;
use crate::types::helm::HelmRelease;
use crate::types::identity_pool::IdentityPoolClient;
use crate::types::kube::Manifest;
use crate::types::parameter::SecretParameter;
use crate::validation::{Validate, Validator};

pub const MONITORING_NAMESPACE: &str = "monitoring";
/// Identity pool client purpose for the Grafana login.
pub const GRAFANA_PURPOSE: &str = "grafana";
/// Kubernetes secret the Grafana chart reads its credentials from.
pub const GRAFANA_SECRET: &str = "grafana-secrets";

/// Parameter names of the generated Grafana secrets, with the key each is
/// exposed under in [`GRAFANA_SECRET`].
pub const GRAFANA_SECRETS: [(&str, &str); 3] = [
    ("monitoring/grafana/admin_user", "admin-user"),
    ("monitoring/grafana/admin_pass", "admin-pass"),
    ("monitoring/grafana/cookie_secret", "GF_SECURITY_SECRET_KEY"),
];

/// Helm releases in install order.
pub const RELEASES: [&str; 3] = ["kube-prometheus-stack", "loki", "promtail"];

pub fn grafana_domain(domain: &str) -> String {
    format!("grafana.{}", domain.trim_end_matches('.'))
}

pub fn grafana_url(domain: &str) -> String {
    format!("https://{}", grafana_domain(domain))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMonitoringOpts {
    pub id: Id,
    pub domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
    #[serde(rename = "userPoolID")]
    pub user_pool_id: String,
    pub auth_domain: String,
}

impl Validate for CreateMonitoringOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain)
            .required("HostedZoneID", &self.hosted_zone_id)
            .required("UserPoolID", &self.user_pool_id)
            .dns_name("AuthDomain", &self.auth_domain);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMonitoringOpts {
    pub id: Id,
    pub domain: String,
}

impl Validate for DeleteMonitoringOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMonitoringOpts {
    pub id: Id,
    pub domain: String,
}

impl Validate for GetMonitoringOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitoring {
    pub id: Id,
    pub grafana_domain: String,
    #[serde(rename = "grafanaURL")]
    pub grafana_url: String,
    pub certificate: Certificate,
    pub pool_client: IdentityPoolClient,
    pub secrets: Vec<SecretParameter>,
    pub manifests: Vec<Manifest>,
    pub releases: Vec<HelmRelease>,
}
