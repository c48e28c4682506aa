//! Domain types and request options for every resource kind.

pub mod argocd;
pub mod certificate;
pub mod cluster;
pub mod composite;
pub mod container_repository;
pub mod controller;
pub mod domain;
pub mod github;
pub mod helm;
pub mod identity_pool;
pub mod kube;
pub mod monitoring;
pub mod parameter;
pub mod policy;
pub mod postgres;
pub mod s3;
pub mod security_group;
pub mod service_account;
pub mod vpc;

pub use argocd::{ArgoCd, CreateArgoCdOpts, DeleteArgoCdOpts, GetArgoCdOpts};
pub use certificate::{Certificate, CreateCertificateOpts, DeleteCertificateOpts};
pub use cluster::{Cluster, ClusterConfig, CreateClusterOpts, DeleteClusterOpts, GetClusterOpts};
pub use composite::{ChildStatus, CompositeStatus};
pub use container_repository::{
    ContainerRepository, CreateContainerRepositoryOpts, DeleteContainerRepositoryOpts,
};
pub use controller::{
    Controller, ControllerInstallation, ControllerSpec, CreateAutoscalerOpts,
    CreateAwsLoadBalancerControllerOpts, CreateBlockstorageOpts, CreateExternalDnsOpts,
    CreateExternalSecretsOpts, DeleteControllerOpts,
};
pub use domain::{CreateHostedZoneOpts, DeleteHostedZoneOpts, HostedZone, ListHostedZonesOpts};
pub use github::{
    CreateOAuthAppOpts, DeleteOAuthAppOpts, DeployKey, GithubRepository, OAuthApp,
    OAuthAppCredentials,
};
pub use helm::{Chart, CreateHelmReleaseOpts, DeleteHelmReleaseOpts, HelmRelease};
pub use identity_pool::{
    CreateIdentityPoolClientOpts, CreateIdentityPoolOpts, DeleteIdentityPoolClientOpts,
    DeleteIdentityPoolOpts, IdentityPool, IdentityPoolClient,
};
pub use kube::{
    CreateManifestOpts, CreateNamespaceOpts, DeleteManifestOpts, DeleteNamespaceOpts, Manifest,
    Namespace,
};
pub use monitoring::{CreateMonitoringOpts, DeleteMonitoringOpts, GetMonitoringOpts, Monitoring};
pub use parameter::{CreateSecretOpts, DeleteSecretOpts, SecretParameter, SecretRef};
pub use policy::{CreatePolicyOpts, DeletePolicyOpts, ManagedPolicy};
pub use postgres::{CreatePostgresDatabaseOpts, DeletePostgresDatabaseOpts, PostgresDatabase};
pub use s3::{CreateS3BucketOpts, DeleteS3BucketOpts, S3Bucket};
pub use security_group::{
    CreateSecurityGroupOpts, DeleteSecurityGroupOpts, SecurityGroup, SecurityGroupRule,
};
pub use service_account::{
    CreateServiceAccountOpts, DeleteServiceAccountOpts, ServiceAccount, ServiceAccountConfig,
};
pub use vpc::{CreateVpcOpts, DeleteVpcOpts, Vpc, VpcSubnet};
