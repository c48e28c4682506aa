//! EKS cluster and the eksctl-style configuration it is created from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::types::vpc::VpcSubnet;
use crate::validation::{Validate, Validator};

/// Kubernetes version used when the options leave it blank.
pub const DEFAULT_KUBERNETES_VERSION: &str = "1.29";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterOpts {
    pub id: Id,
    pub cidr: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "vpcID")]
    pub vpc_id: String,
    #[serde(default)]
    pub vpc_private_subnets: Vec<VpcSubnet>,
    #[serde(default)]
    pub vpc_public_subnets: Vec<VpcSubnet>,
}

impl CreateClusterOpts {
    pub fn kubernetes_version(&self) -> &str {
        if self.version.is_empty() {
            DEFAULT_KUBERNETES_VERSION
        } else {
            &self.version
        }
    }
}

impl Validate for CreateClusterOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.cidr("Cidr", &self.cidr);
        v.required("VpcID", &self.vpc_id);
        for (i, subnet) in self.vpc_private_subnets.iter().enumerate() {
            v.nested(&format!("VpcPrivateSubnets[{i}]"), subnet);
        }
        for (i, subnet) in self.vpc_public_subnets.iter().enumerate() {
            v.nested(&format!("VpcPublicSubnets[{i}]"), subnet);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteClusterOpts {
    pub id: Id,
}

impl Validate for DeleteClusterOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

impl Keyed for DeleteClusterOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.id.cluster_name.clone()
    }
}

/// Options for reading a stored cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetClusterOpts {
    pub id: Id,
}

impl Validate for GetClusterOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: Id,
    pub name: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
    pub config: ClusterConfig,
}

impl Resource for Cluster {
    const KIND: &'static str = "cluster";
    type Create = CreateClusterOpts;
    type Delete = DeleteClusterOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

// ── eksctl configuration ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: ClusterMeta,
    pub iam: ClusterIam,
    pub vpc: ClusterVpc,
    #[serde(default)]
    pub managed_node_groups: Vec<NodeGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMeta {
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterIam {
    #[serde(rename = "withOIDC")]
    pub with_oidc: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_role_permissions_boundary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fargate_pod_execution_role_permissions_boundary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_accounts: Vec<ClusterIamServiceAccount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterIamServiceAccount {
    pub metadata: ObjectMeta,
    #[serde(rename = "attachPolicyARNs")]
    pub attach_policy_arns: Vec<String>,
    pub permissions_boundary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterVpc {
    pub id: String,
    pub cidr: String,
    pub cluster_endpoints: ClusterEndpoints,
    pub subnets: ClusterSubnets,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEndpoints {
    pub private_access: bool,
    pub public_access: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSubnets {
    #[serde(default)]
    pub private: BTreeMap<String, ClusterNetwork>,
    #[serde(default)]
    pub public: BTreeMap<String, ClusterNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNetwork {
    pub id: String,
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroup {
    pub name: String,
    pub instance_type: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    pub volume_size: u32,
    pub private_networking: bool,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ClusterConfig {
    /// Build the cluster configuration from validated create options.
    pub fn build(opts: &CreateClusterOpts) -> Self {
        let id = &opts.id;
        let boundary = id.permissions_boundary_arn();
        let networks = |subnets: &[VpcSubnet]| {
            subnets
                .iter()
                .map(|s| {
                    (
                        s.availability_zone.clone(),
                        ClusterNetwork {
                            id: s.id.clone(),
                            cidr: s.cidr.clone(),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>()
        };
        let tags: BTreeMap<String, String> = id.tags().into_iter().collect();

        Self {
            api_version: "eksctl.io/v1alpha5".to_string(),
            kind: "ClusterConfig".to_string(),
            metadata: ClusterMeta {
                name: id.cluster_name.clone(),
                region: id.region.clone(),
                version: opts.kubernetes_version().to_string(),
                tags: tags.clone(),
            },
            iam: ClusterIam {
                with_oidc: true,
                service_role_permissions_boundary: boundary.clone(),
                fargate_pod_execution_role_permissions_boundary: boundary,
                service_accounts: Vec::new(),
            },
            vpc: ClusterVpc {
                id: opts.vpc_id.clone(),
                cidr: opts.cidr.clone(),
                cluster_endpoints: ClusterEndpoints {
                    private_access: true,
                    public_access: true,
                },
                subnets: ClusterSubnets {
                    private: networks(&opts.vpc_private_subnets),
                    public: networks(&opts.vpc_public_subnets),
                },
            },
            managed_node_groups: vec![NodeGroup {
                name: format!("{}-ng-generic", id.environment),
                instance_type: "m5.large".to_string(),
                min_size: 1,
                max_size: 10,
                desired_capacity: 2,
                volume_size: 80,
                private_networking: true,
                labels: BTreeMap::from([(
                    "pool".to_string(),
                    format!("{}-ng-generic", id.environment),
                )]),
                tags: tags
                    .into_iter()
                    .chain([
                        (
                            "k8s.io/cluster-autoscaler/enabled".to_string(),
                            "true".to_string(),
                        ),
                        (
                            format!("k8s.io/cluster-autoscaler/{}", id.cluster_name),
                            "owned".to_string(),
                        ),
                    ])
                    .collect(),
            }],
        }
    }
}
