//! Request dispatch.
//!
//! Every transport funnels into [`Handler::handle`]: the HTTP server after
//! resolving the route, the direct transport straight from a client call.

use async_trait::async_trait;
use okctl_core::types::*;
use okctl_core::{Ctx, ErrorContext, Request, Response, Result, Validate};

use crate::services::Services;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Ctx, request: Request) -> Result<Response>;
}

#[async_trait]
impl Handler for Services {
    async fn handle(&self, ctx: &Ctx, request: Request) -> Result<Response> {
        use Request as Rq;

        let response = match request {
            Rq::CreateCluster(o) => Response::Cluster(self.clusters.create(ctx, &o).await?),
            Rq::DeleteCluster(o) => empty(self.clusters.delete(ctx, &o).await)?,
            Rq::GetCluster(o) => {
                o.validate().stage("validating inputs")?;
                Response::Cluster(self.clusters.one(&o.id, &o.id.cluster_name)?)
            }
            Rq::CreateVpc(o) => Response::Vpc(self.vpcs.create(ctx, &o).await?),
            Rq::DeleteVpc(o) => empty(self.vpcs.delete(ctx, &o).await)?,
            Rq::CreateCertificate(o) => {
                Response::Certificate(self.certificates.create(ctx, &o).await?)
            }
            Rq::DeleteCertificate(o) => empty(self.certificates.delete(ctx, &o).await)?,
            Rq::CreateHostedZone(o) => {
                Response::HostedZone(self.hosted_zones.create(ctx, &o).await?)
            }
            Rq::DeleteHostedZone(o) => empty(self.hosted_zones.delete(ctx, &o).await)?,
            Rq::ListHostedZones(o) => {
                o.validate().stage("validating inputs")?;
                Response::HostedZones(self.hosted_zones.list(&o.id)?)
            }
            Rq::CreatePolicy(o) => Response::ManagedPolicy(self.policies.create(ctx, &o).await?),
            Rq::DeletePolicy(o) => empty(self.policies.delete(ctx, &o).await)?,
            Rq::CreateServiceAccount(o) => {
                Response::ServiceAccount(self.service_accounts.create(ctx, &o).await?)
            }
            Rq::DeleteServiceAccount(o) => empty(self.service_accounts.delete(ctx, &o).await)?,
            Rq::CreateHelmRelease(o) => Response::HelmRelease(self.helm.create(ctx, &o).await?),
            Rq::DeleteHelmRelease(o) => empty(self.helm.delete(ctx, &o).await)?,
            Rq::CreateIdentityPool(o) => {
                Response::IdentityPool(self.identity_pools.create(ctx, &o).await?)
            }
            Rq::DeleteIdentityPool(o) => empty(self.identity_pools.delete(ctx, &o).await)?,
            Rq::CreateIdentityPoolClient(o) => {
                Response::IdentityPoolClient(self.identity_pool_clients.create(ctx, &o).await?)
            }
            Rq::DeleteIdentityPoolClient(o) => {
                empty(self.identity_pool_clients.delete(ctx, &o).await)?
            }
            Rq::CreateSecret(o) => Response::SecretParameter(self.secrets.create(ctx, &o).await?),
            Rq::DeleteSecret(o) => empty(self.secrets.delete(ctx, &o).await)?,
            Rq::CreateSecurityGroup(o) => {
                Response::SecurityGroup(self.security_groups.create(ctx, &o).await?)
            }
            Rq::DeleteSecurityGroup(o) => empty(self.security_groups.delete(ctx, &o).await)?,
            Rq::CreateContainerRepository(o) => {
                Response::ContainerRepository(self.container_repositories.create(ctx, &o).await?)
            }
            Rq::DeleteContainerRepository(o) => {
                empty(self.container_repositories.delete(ctx, &o).await)?
            }
            Rq::CreatePostgresDatabase(o) => {
                Response::PostgresDatabase(self.postgres.create(ctx, &o).await?)
            }
            Rq::DeletePostgresDatabase(o) => empty(self.postgres.delete(ctx, &o).await)?,
            Rq::CreateS3Bucket(o) => Response::S3Bucket(self.s3_buckets.create(ctx, &o).await?),
            Rq::DeleteS3Bucket(o) => empty(self.s3_buckets.delete(ctx, &o).await)?,
            Rq::CreateNamespace(o) => Response::Namespace(self.namespaces.create(ctx, &o).await?),
            Rq::DeleteNamespace(o) => empty(self.namespaces.delete(ctx, &o).await)?,
            Rq::CreateManifest(o) => Response::Manifest(self.manifests.create(ctx, &o).await?),
            Rq::DeleteManifest(o) => empty(self.manifests.delete(ctx, &o).await)?,
            Rq::CreateOAuthApp(o) => Response::OAuthApp(self.oauth_apps.create(ctx, &o).await?),
            Rq::DeleteOAuthApp(o) => empty(self.oauth_apps.delete(ctx, &o).await)?,
            Rq::CreateArgoCd(o) => Response::ArgoCd(self.argocd.create(ctx, &o).await?),
            Rq::DeleteArgoCd(o) => empty(self.argocd.delete(ctx, &o).await)?,
            Rq::GetArgoCd(o) => Response::CompositeStatus(self.argocd.status(&o)?),
            Rq::CreateMonitoring(o) => Response::Monitoring(self.monitoring.create(ctx, &o).await?),
            Rq::DeleteMonitoring(o) => empty(self.monitoring.delete(ctx, &o).await)?,
            Rq::GetMonitoring(o) => Response::CompositeStatus(self.monitoring.status(&o)?),
            Rq::CreateAutoscaler(o) => self.install(ctx, &o).await?,
            Rq::DeleteAutoscaler(o) => self.uninstall(ctx, Controller::Autoscaler, &o).await?,
            Rq::CreateBlockstorage(o) => self.install(ctx, &o).await?,
            Rq::DeleteBlockstorage(o) => self.uninstall(ctx, Controller::Blockstorage, &o).await?,
            Rq::CreateAwsLoadBalancerController(o) => self.install(ctx, &o).await?,
            Rq::DeleteAwsLoadBalancerController(o) => {
                self.uninstall(ctx, Controller::AwsLoadBalancerController, &o).await?
            }
            Rq::CreateExternalDns(o) => self.install(ctx, &o).await?,
            Rq::DeleteExternalDns(o) => self.uninstall(ctx, Controller::ExternalDns, &o).await?,
            Rq::CreateExternalSecrets(o) => self.install(ctx, &o).await?,
            Rq::DeleteExternalSecrets(o) => {
                self.uninstall(ctx, Controller::ExternalSecrets, &o).await?
            }
        };
        Ok(response)
    }
}

impl Services {
    async fn install<O>(&self, ctx: &Ctx, opts: &O) -> Result<Response>
    where
        O: Validate + Sync,
        for<'a> ControllerSpec: From<&'a O>,
    {
        let installed = self.controllers.install(ctx, opts).await?;
        Ok(Response::ControllerInstallation(installed))
    }

    async fn uninstall(
        &self,
        ctx: &Ctx,
        controller: Controller,
        opts: &DeleteControllerOpts,
    ) -> Result<Response> {
        self.controllers.uninstall(ctx, controller, opts).await?;
        Ok(Response::Empty)
    }
}

fn empty(result: Result<()>) -> Result<Response> {
    result.map(|()| Response::Empty)
}
