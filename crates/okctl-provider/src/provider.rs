//! Collaborator traits.
//!
//! A provider performs the actual mutation for one kind: a CloudFormation
//! stack, an eksctl run, a Helm install, a GitHub API call. Options reach a
//! provider only after they validated.

use std::sync::Arc;

use async_trait::async_trait;
use okctl_core::types::*;
use okctl_core::{Ctx, Resource};

use crate::error::ProviderResult;

/// Creates and deletes one resource kind.
#[async_trait]
pub trait CloudProvider<R: Resource>: Send + Sync {
    async fn create(&self, ctx: &Ctx, opts: &R::Create) -> ProviderResult<R>;

    async fn delete(&self, ctx: &Ctx, opts: &R::Delete) -> ProviderResult<()>;
}

/// Cognito user pools. The pool is created with the certificate serving
/// its auth domain, so creation takes that certificate as input.
#[async_trait]
pub trait IdentityPoolProvider: Send + Sync {
    async fn create_identity_pool(
        &self,
        ctx: &Ctx,
        opts: &CreateIdentityPoolOpts,
        certificate: &Certificate,
    ) -> ProviderResult<IdentityPool>;

    async fn delete_identity_pool(
        &self,
        ctx: &Ctx,
        opts: &DeleteIdentityPoolOpts,
    ) -> ProviderResult<()>;
}

/// GitHub organisation API.
#[async_trait]
pub trait GithubProvider: Send + Sync {
    /// Register an OAuth app and return its credentials.
    async fn create_oauth_app(
        &self,
        ctx: &Ctx,
        opts: &CreateOAuthAppOpts,
    ) -> ProviderResult<OAuthAppCredentials>;

    async fn delete_oauth_app(&self, ctx: &Ctx, opts: &DeleteOAuthAppOpts) -> ProviderResult<()>;
}

/// Every collaborator the services need, one per kind.
#[derive(Clone)]
pub struct Providers {
    pub cluster: Arc<dyn CloudProvider<Cluster>>,
    pub vpc: Arc<dyn CloudProvider<Vpc>>,
    pub certificate: Arc<dyn CloudProvider<Certificate>>,
    pub hosted_zone: Arc<dyn CloudProvider<HostedZone>>,
    pub policy: Arc<dyn CloudProvider<ManagedPolicy>>,
    pub service_account: Arc<dyn CloudProvider<ServiceAccount>>,
    pub helm: Arc<dyn CloudProvider<HelmRelease>>,
    pub identity_pool: Arc<dyn IdentityPoolProvider>,
    pub identity_pool_client: Arc<dyn CloudProvider<IdentityPoolClient>>,
    pub secret: Arc<dyn CloudProvider<SecretParameter>>,
    pub security_group: Arc<dyn CloudProvider<SecurityGroup>>,
    pub container_repository: Arc<dyn CloudProvider<ContainerRepository>>,
    pub postgres: Arc<dyn CloudProvider<PostgresDatabase>>,
    pub s3: Arc<dyn CloudProvider<S3Bucket>>,
    pub namespace: Arc<dyn CloudProvider<Namespace>>,
    pub manifest: Arc<dyn CloudProvider<Manifest>>,
    pub github: Arc<dyn GithubProvider>,
}
