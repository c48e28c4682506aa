//! Plain Kubernetes objects applied through the Kubernetes collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::validation::{Validate, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNamespaceOpts {
    pub id: Id,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Validate for CreateNamespaceOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Namespace", &self.namespace);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNamespaceOpts {
    pub id: Id,
    pub namespace: String,
}

impl Validate for DeleteNamespaceOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Namespace", &self.namespace);
        v.finish()
    }
}

impl Keyed for DeleteNamespaceOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.namespace.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub id: Id,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

impl Resource for Namespace {
    const KIND: &'static str = "namespace";
    type Create = CreateNamespaceOpts;
    type Delete = DeleteNamespaceOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.namespace.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateManifestOpts {
    pub id: Id,
    pub name: String,
    pub namespace: String,
    /// The Kubernetes object, as a JSON document.
    pub content: serde_json::Value,
}

impl Validate for CreateManifestOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Name", &self.name)
            .k8s_name("Namespace", &self.namespace)
            .check(
                "Content",
                self.content.get("apiVersion").is_some() && self.content.get("kind").is_some(),
                "must be a kubernetes object with apiVersion and kind",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManifestOpts {
    pub id: Id,
    pub name: String,
    pub namespace: String,
}

impl Validate for DeleteManifestOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Name", &self.name)
            .k8s_name("Namespace", &self.namespace);
        v.finish()
    }
}

impl Keyed for DeleteManifestOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: Id,
    pub name: String,
    pub namespace: String,
    pub content: serde_json::Value,
}

impl Resource for Manifest {
    const KIND: &'static str = "kubernetes manifest";
    type Create = CreateManifestOpts;
    type Delete = DeleteManifestOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// An `ExternalSecret` object syncing parameter store entries into a
/// Kubernetes `Secret`. Only parameter paths appear in the manifest.
pub fn external_secret(name: &str, namespace: &str, data: &[(&str, &str)]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = data
        .iter()
        .map(|(key, path)| {
            serde_json::json!({
                "secretKey": key,
                "remoteRef": { "key": path },
            })
        })
        .collect();
    serde_json::json!({
        "apiVersion": "external-secrets.io/v1beta1",
        "kind": "ExternalSecret",
        "metadata": { "name": name, "namespace": namespace },
        "spec": {
            "refreshInterval": "1h",
            "secretStoreRef": { "name": "parameter-store", "kind": "ClusterSecretStore" },
            "target": { "name": name, "creationPolicy": "Owner" },
            "data": data,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_secret_references_paths_only() {
        let doc = external_secret(
            "argocd-secret",
            "argocd",
            &[("server.secretkey", "/okctl/okctl-staging/argocd/secret_key")],
        );
        assert_eq!(doc["kind"], "ExternalSecret");
        assert_eq!(
            doc["spec"]["data"][0]["remoteRef"]["key"],
            "/okctl/okctl-staging/argocd/secret_key"
        );
    }

    #[test]
    fn manifest_without_kind_is_invalid() {
        let opts = CreateManifestOpts {
            id: Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging"),
            name: "cm".to_string(),
            namespace: "default".to_string(),
            content: serde_json::json!({ "apiVersion": "v1" }),
        };
        let err = opts.validate().unwrap_err();
        assert!(err.message().starts_with("Content:"));
    }
}
