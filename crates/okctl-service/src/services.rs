//! Composition root.
//!
//! Built once at process start from a provider set and a state store, then
//! shared behind an `Arc`. Composites get clones of the resource services
//! they depend on; clones share providers and storage.

use okctl_core::types::*;
use okctl_provider::Providers;
use okctl_state::StateStore;

use crate::argocd::ArgoCdService;
use crate::controller::ControllerService;
use crate::github::OAuthAppService;
use crate::identity_pool::IdentityPoolService;
use crate::monitoring::MonitoringService;
use crate::resource::ResourceService;

#[derive(Clone)]
pub struct Services {
    pub clusters: ResourceService<Cluster>,
    pub vpcs: ResourceService<Vpc>,
    pub certificates: ResourceService<Certificate>,
    pub hosted_zones: ResourceService<HostedZone>,
    pub policies: ResourceService<ManagedPolicy>,
    pub service_accounts: ResourceService<ServiceAccount>,
    pub helm: ResourceService<HelmRelease>,
    pub identity_pools: IdentityPoolService,
    pub identity_pool_clients: ResourceService<IdentityPoolClient>,
    pub secrets: ResourceService<SecretParameter>,
    pub security_groups: ResourceService<SecurityGroup>,
    pub container_repositories: ResourceService<ContainerRepository>,
    pub postgres: ResourceService<PostgresDatabase>,
    pub s3_buckets: ResourceService<S3Bucket>,
    pub namespaces: ResourceService<Namespace>,
    pub manifests: ResourceService<Manifest>,
    pub oauth_apps: OAuthAppService,
    pub argocd: ArgoCdService,
    pub monitoring: MonitoringService,
    pub controllers: ControllerService,
}

impl Services {
    pub fn new(providers: Providers, state: StateStore) -> Self {
        let state = &state;
        let certificates = ResourceService::with_state(providers.certificate, state);
        let policies = ResourceService::with_state(providers.policy, state);
        let service_accounts = ResourceService::with_state(providers.service_account, state);
        let helm = ResourceService::with_state(providers.helm, state);
        let identity_pool_clients =
            ResourceService::with_state(providers.identity_pool_client, state);
        let secrets = ResourceService::with_state(providers.secret, state);
        let namespaces = ResourceService::with_state(providers.namespace, state);
        let manifests = ResourceService::with_state(providers.manifest, state);

        let oauth_apps = OAuthAppService::new(providers.github, secrets.clone(), state);
        let identity_pools =
            IdentityPoolService::new(certificates.clone(), providers.identity_pool, state);
        let argocd = ArgoCdService::new(
            certificates.clone(),
            oauth_apps.clone(),
            secrets.clone(),
            namespaces.clone(),
            manifests.clone(),
            helm.clone(),
        );
        let monitoring = MonitoringService::new(
            namespaces.clone(),
            certificates.clone(),
            identity_pool_clients.clone(),
            secrets.clone(),
            manifests.clone(),
            helm.clone(),
        );
        let controllers =
            ControllerService::new(policies.clone(), service_accounts.clone(), helm.clone());

        Self {
            clusters: ResourceService::with_state(providers.cluster, state),
            vpcs: ResourceService::with_state(providers.vpc, state),
            certificates,
            hosted_zones: ResourceService::with_state(providers.hosted_zone, state),
            policies,
            service_accounts,
            helm,
            identity_pools,
            identity_pool_clients,
            secrets,
            security_groups: ResourceService::with_state(providers.security_group, state),
            container_repositories: ResourceService::with_state(
                providers.container_repository,
                state,
            ),
            postgres: ResourceService::with_state(providers.postgres, state),
            s3_buckets: ResourceService::with_state(providers.s3, state),
            namespaces,
            manifests,
            oauth_apps,
            argocd,
            monitoring,
            controllers,
        }
    }
}
