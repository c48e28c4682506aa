//! Kubernetes service accounts bound to an IAM role (IRSA).
//!
//! The role binding is described by a [`ServiceAccountConfig`], an
//! eksctl-style document naming the cluster, the account and the policy the
//! role attaches. Deletes build the same document with the policy ARN set to
//! [`POLICY_ARN_NOT_APPLICABLE`] since the policy may already be gone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::types::cluster::{ClusterIam, ClusterIamServiceAccount, ClusterMeta, ObjectMeta};
use crate::validation::{Validate, Validator};

/// Placeholder policy ARN used when building the config for a delete.
pub const POLICY_ARN_NOT_APPLICABLE: &str = "n/a";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ClusterMeta,
    pub iam: ClusterIam,
}

impl ServiceAccountConfig {
    /// Build the role binding document.
    ///
    /// `policy_arn` is either a real ARN (create) or
    /// [`POLICY_ARN_NOT_APPLICABLE`] (delete); both succeed identically.
    pub fn build(
        cluster_name: &str,
        region: &str,
        name: &str,
        namespace: &str,
        policy_arn: &str,
        permissions_boundary_arn: &str,
    ) -> Result<Self, Error> {
        let mut v = Validator::new();
        v.required("ClusterName", cluster_name)
            .required("Region", region)
            .k8s_name("Name", name)
            .k8s_name("Namespace", namespace)
            .arn("PermissionsBoundaryARN", permissions_boundary_arn);
        if policy_arn != POLICY_ARN_NOT_APPLICABLE {
            v.arn("PolicyARN", policy_arn);
        }
        v.finish()?;

        Ok(Self {
            api_version: "eksctl.io/v1alpha5".to_string(),
            kind: "ClusterConfig".to_string(),
            metadata: ClusterMeta {
                name: cluster_name.to_string(),
                region: region.to_string(),
                version: String::new(),
                tags: BTreeMap::new(),
            },
            iam: ClusterIam {
                with_oidc: true,
                service_accounts: vec![ClusterIamServiceAccount {
                    metadata: ObjectMeta {
                        name: name.to_string(),
                        namespace: namespace.to_string(),
                        labels: BTreeMap::from([(
                            "aws-usage".to_string(),
                            "cluster-ops".to_string(),
                        )]),
                    },
                    attach_policy_arns: vec![policy_arn.to_string()],
                    permissions_boundary: permissions_boundary_arn.to_string(),
                }],
                ..Default::default()
            },
        })
    }

    /// Build from an identity, deriving the permissions boundary from its account.
    pub fn for_identity(
        id: &Id,
        name: &str,
        namespace: &str,
        policy_arn: &str,
    ) -> Result<Self, Error> {
        Self::build(
            &id.cluster_name,
            &id.region,
            name,
            namespace,
            policy_arn,
            &id.permissions_boundary_arn(),
        )
    }
}

impl Validate for ServiceAccountConfig {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        v.required("Metadata.Name", &self.metadata.name)
            .required("Metadata.Region", &self.metadata.region)
            .check(
                "IAM.ServiceAccounts",
                self.iam.service_accounts.len() == 1,
                "must contain exactly one service account",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAccountOpts {
    pub id: Id,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "policyARN")]
    pub policy_arn: String,
    pub config: ServiceAccountConfig,
}

impl Validate for CreateServiceAccountOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Name", &self.name)
            .k8s_name("Namespace", &self.namespace)
            .arn("PolicyARN", &self.policy_arn)
            .nested("Config", &self.config);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteServiceAccountOpts {
    pub id: Id,
    pub name: String,
    pub namespace: String,
    pub config: ServiceAccountConfig,
}

impl Validate for DeleteServiceAccountOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Name", &self.name)
            .k8s_name("Namespace", &self.namespace)
            .nested("Config", &self.config);
        v.finish()
    }
}

impl Keyed for DeleteServiceAccountOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub id: Id,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "policyARN")]
    pub policy_arn: String,
    pub config: ServiceAccountConfig,
}

impl Resource for ServiceAccount {
    const KIND: &'static str = "service account";
    type Create = CreateServiceAccountOpts;
    type Delete = DeleteServiceAccountOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
