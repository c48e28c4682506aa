//! Helm chart releases installed through the Kubernetes collaborator.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::validation::{Validate, Validator};

/// A chart and the values to install it with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub repository_name: String,
    #[serde(rename = "repositoryURL")]
    pub repository_url: String,
    pub release_name: String,
    pub version: String,
    pub chart: String,
    pub namespace: String,
    /// Install timeout in seconds.
    pub timeout_secs: u64,
    #[serde(default)]
    pub values: serde_json::Value,
}

impl Validate for Chart {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        v.required("RepositoryName", &self.repository_name)
            .check(
                "RepositoryURL",
                self.repository_url.starts_with("https://")
                    || self.repository_url.starts_with("oci://"),
                "must be an https:// or oci:// URL",
            )
            .k8s_name("ReleaseName", &self.release_name)
            .semver("Version", &self.version)
            .required("Chart", &self.chart)
            .k8s_name("Namespace", &self.namespace)
            .check("TimeoutSecs", self.timeout_secs > 0, "must be greater than 0");
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHelmReleaseOpts {
    pub id: Id,
    pub chart: Chart,
}

impl Validate for CreateHelmReleaseOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        if let Err(e) = self.chart.validate() {
            for (field, message) in e.detail() {
                v.fail(&format!("Chart.{field}"), message.clone());
            }
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHelmReleaseOpts {
    pub id: Id,
    pub release_name: String,
    pub namespace: String,
}

impl Validate for DeleteHelmReleaseOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("ReleaseName", &self.release_name)
            .k8s_name("Namespace", &self.namespace);
        v.finish()
    }
}

impl Keyed for DeleteHelmReleaseOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.release_name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmRelease {
    pub id: Id,
    pub release_name: String,
    pub namespace: String,
    pub chart: Chart,
    /// Release revision reported by Helm.
    pub revision: u32,
    pub status: String,
}

impl Resource for HelmRelease {
    const KIND: &'static str = "helm release";
    type Create = CreateHelmReleaseOpts;
    type Delete = DeleteHelmReleaseOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.release_name.clone()
    }
}
